//! API handlers for the bookstore REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod lending;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
        HeaderValue, Method,
    },
    routing::{get, patch, post},
    Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::IntoParams;

use crate::{config::ServerConfig, error::AppError, models::UserClaims, AppState};

/// Extractor for authenticated user from the JWT cookie
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = &state.services.auth;
        let jar = CookieJar::from_headers(&parts.headers);

        // Cookie first, then a Bearer header for non-browser clients
        let token = match jar.get(&auth.config().cookie_name) {
            Some(cookie) => cookie.value().to_string(),
            None => parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_string)
                .ok_or_else(|| {
                    AppError::Authentication("Unauthorized: No token provided".to_string())
                })?,
        };

        let claims = auth.verify(&token)?;

        Ok(AuthenticatedUser(claims))
    }
}

/// `?email=` selector used by the per-user endpoints
#[derive(Debug, Deserialize, IntoParams)]
pub struct EmailQuery {
    /// Must match the signed-in user's email
    pub email: Option<String>,
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth", post(auth::sign_in))
        .route("/logout", post(auth::sign_out))
        // Catalog
        .route("/all-books", get(books::list_all_books))
        .route(
            "/all-books/:id",
            patch(books::update_book).delete(books::delete_book),
        )
        .route("/books", get(books::list_books_by_category))
        .route("/book-details/:id", get(books::get_book))
        .route("/addbook", post(books::add_book))
        .route("/available-books", get(books::list_available_books))
        // Lending
        .route("/borrow-book", post(lending::borrow_book))
        .route("/return-book", post(lending::return_book))
        .route("/borrowedbooks", get(lending::list_borrowed_books))
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Credentialed CORS for the configured front-end origins
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}
