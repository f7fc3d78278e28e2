//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::{
        schema::{AdditionalProperties, KnownFormat, ObjectBuilder, SchemaFormat, SchemaType},
        security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
        RefOr, Schema,
    },
    Modify, OpenApi, ToSchema,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    api::{auth, books, health, lending},
    models::{Book, BorrowRecord, BorrowRequest, CreateBook, ReturnRequest, SignIn, UpdateBook},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookstore API",
        version = "1.0.0",
        description = "Book catalog and lending REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::sign_in,
        auth::sign_out,
        // Books
        books::list_all_books,
        books::list_books_by_category,
        books::list_available_books,
        books::get_book,
        books::add_book,
        books::update_book,
        books::delete_book,
        // Lending
        lending::borrow_book,
        lending::return_book,
        lending::list_borrowed_books,
    ),
    components(
        schemas(
            Book,
            CreateBook,
            UpdateBook,
            books::BookCreatedResponse,
            BorrowRecord,
            BorrowRequest,
            ReturnRequest,
            lending::BorrowResponse,
            SignIn,
            auth::MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Sign-in cookie management"),
        (name = "books", description = "Catalog browsing and administration"),
        (name = "lending", description = "Borrowing and returning books")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("authToken"))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

fn string() -> ObjectBuilder {
    ObjectBuilder::new().schema_type(SchemaType::String)
}

fn formatted(format: KnownFormat) -> ObjectBuilder {
    string().format(Some(SchemaFormat::KnownFormat(format)))
}

fn quantity() -> ObjectBuilder {
    ObjectBuilder::new()
        .schema_type(SchemaType::Integer)
        .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int32)))
        .minimum(Some(0.0))
}

/// Known book fields; any other field is stored and served as given
fn book_fields(object: ObjectBuilder) -> ObjectBuilder {
    object
        .property("name", string())
        .property("category", string())
        .property("quantity", quantity())
        .additional_properties(Some(AdditionalProperties::FreeForm(true)))
}

impl<'s> ToSchema<'s> for Book {
    fn schema() -> (&'s str, RefOr<Schema>) {
        let object = ObjectBuilder::new().property("_id", formatted(KnownFormat::Uuid));
        (
            "Book",
            book_fields(object)
                .required("_id")
                .required("name")
                .required("quantity")
                .into(),
        )
    }
}

impl<'s> ToSchema<'s> for BorrowRecord {
    fn schema() -> (&'s str, RefOr<Schema>) {
        let object = ObjectBuilder::new()
            .property("_id", formatted(KnownFormat::Uuid))
            .property("bookId", formatted(KnownFormat::Uuid))
            .property("userEmail", string())
            .property("returnDate", string())
            .property("borrowedAt", formatted(KnownFormat::DateTime))
            .description(Some("Borrow record with a copy of the book as it was when borrowed"));
        (
            "BorrowRecord",
            book_fields(object)
                .required("_id")
                .required("bookId")
                .required("userEmail")
                .required("returnDate")
                .required("borrowedAt")
                .into(),
        )
    }
}

impl<'s> ToSchema<'s> for CreateBook {
    fn schema() -> (&'s str, RefOr<Schema>) {
        (
            "CreateBook",
            book_fields(ObjectBuilder::new())
                .required("name")
                .required("quantity")
                .into(),
        )
    }
}

impl<'s> ToSchema<'s> for UpdateBook {
    fn schema() -> (&'s str, RefOr<Schema>) {
        let object = ObjectBuilder::new().description(Some("Fields to change; absent fields are kept"));
        ("UpdateBook", book_fields(object).into())
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
