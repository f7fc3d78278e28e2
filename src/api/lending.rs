//! Borrow and return endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::{BorrowId, BorrowRecord, BorrowRequest, ReturnOutcome, ReturnRequest},
    AppState,
};

use super::{auth::MessageResponse, AuthenticatedUser, EmailQuery};

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowResponse {
    pub message: String,
    /// Id of the new borrow record
    #[schema(value_type = String, format = Uuid)]
    pub borrowed_id: BorrowId,
}

/// Borrow a book for the signed-in user
#[utoipa::path(
    post,
    path = "/borrow-book",
    tag = "lending",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 200, description = "Book borrowed", body = BorrowResponse),
        (status = 400, description = "Missing fields, limit reached, already borrowed or out of stock", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "userEmail is not the signed-in user", body = ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(request), _): WithRejection<Json<BorrowRequest>, AppError>,
) -> AppResult<Json<BorrowResponse>> {
    claims.require_email(request.user_email.as_deref())?;

    let borrowed_id = state.services.lending.borrow_book(request).await?;

    Ok(Json(BorrowResponse {
        message: "Book borrowed successfully".to_string(),
        borrowed_id,
    }))
}

/// Return a book borrowed by the signed-in user
#[utoipa::path(
    post,
    path = "/return-book",
    tag = "lending",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = MessageResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "userEmail is not the signed-in user", body = ErrorResponse),
        (status = 404, description = "No borrow record for this book and user", body = ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(request), _): WithRejection<Json<ReturnRequest>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_email(request.user_email.as_deref())?;

    let message = match state.services.lending.return_book(request).await? {
        ReturnOutcome::Restocked => "Book returned successfully",
        ReturnOutcome::Orphaned => "Book returned; it is no longer in the catalog",
    };

    Ok(MessageResponse::new(message))
}

/// Books currently borrowed by the signed-in user
#[utoipa::path(
    get,
    path = "/borrowedbooks",
    tag = "lending",
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    params(EmailQuery),
    responses(
        (status = 200, description = "Active borrow records", body = Vec<BorrowRecord>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "email is not the signed-in user", body = ErrorResponse)
    )
)]
pub async fn list_borrowed_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<EmailQuery>,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    claims.require_email(query.email.as_deref())?;

    let records = state.services.lending.list_borrowed(&claims.email).await?;
    Ok(Json(records))
}
