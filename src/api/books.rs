//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::{Book, BookFilter, BookId, CreateBook, UpdateBook},
    AppState,
};

use super::{auth::MessageResponse, AuthenticatedUser, EmailQuery};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryQuery {
    /// Exact category name
    pub cat: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookCreatedResponse {
    pub message: String,
    #[schema(value_type = String, format = Uuid)]
    pub book_id: BookId,
}

/// Book ids in paths that do not parse cannot name an existing book
fn path_book_id(id: &str) -> AppResult<BookId> {
    id.parse()
        .map_err(|_| AppError::NotFound("Book not found".to_string()))
}

/// List every book (admin)
#[utoipa::path(
    get,
    path = "/all-books",
    tag = "books",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(EmailQuery),
    responses(
        (status = 200, description = "Whole catalog", body = Vec<Book>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "email is not the signed-in user", body = ErrorResponse)
    )
)]
pub async fn list_all_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<EmailQuery>,
) -> AppResult<Json<Vec<Book>>> {
    claims.require_email(query.email.as_deref())?;

    let books = state.services.catalog.list_books(BookFilter::All).await?;
    Ok(Json(books))
}

/// List books in a category
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(CategoryQuery),
    responses(
        (status = 200, description = "Books in the category", body = Vec<Book>)
    )
)]
pub async fn list_books_by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let category = query.cat.unwrap_or_default();
    let books = state
        .services
        .catalog
        .list_books(BookFilter::Category(category))
        .await?;
    Ok(Json(books))
}

/// List books with at least one copy available
#[utoipa::path(
    get,
    path = "/available-books",
    tag = "books",
    responses(
        (status = 200, description = "Books in stock", body = Vec<Book>)
    )
)]
pub async fn list_available_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books(BookFilter::Available).await?;
    Ok(Json(books))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/book-details/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book found", body = Book),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(path_book_id(&id)?).await?;
    Ok(Json(book))
}

/// Add a book (admin)
#[utoipa::path(
    post,
    path = "/addbook",
    tag = "books",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(EmailQuery),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book added", body = BookCreatedResponse),
        (status = 400, description = "Missing name or invalid quantity", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "email is not the signed-in user", body = ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<EmailQuery>,
    WithRejection(Json(request), _): WithRejection<Json<CreateBook>, AppError>,
) -> AppResult<(StatusCode, Json<BookCreatedResponse>)> {
    claims.require_email(query.email.as_deref())?;

    let book_id = state.services.catalog.create_book(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookCreatedResponse {
            message: "Book added successfully".to_string(),
            book_id,
        }),
    ))
}

/// Edit a book (admin)
#[utoipa::path(
    patch,
    path = "/all-books/{id}",
    tag = "books",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = MessageResponse),
        (status = 400, description = "Invalid quantity", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<String>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateBook>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    let id = path_book_id(&id)?;
    state.services.catalog.update_book(id, request).await?;
    Ok(MessageResponse::new("Book updated successfully"))
}

/// Delete a book (admin)
#[utoipa::path(
    delete,
    path = "/all-books/{id}",
    tag = "books",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = path_book_id(&id)?;
    state.services.catalog.delete_book(id).await?;
    Ok(MessageResponse::new("Book deleted successfully"))
}
