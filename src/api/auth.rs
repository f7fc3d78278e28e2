//! Sign-in and logout endpoints

use axum::{extract::State, Json};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar, WithRejection,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::SignIn,
    AppState,
};

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Build the auth cookie with the configured security attributes
fn auth_cookie(state: &AppState, value: String) -> Cookie<'static> {
    let config = state.services.auth.config();
    let same_site = if config.secure_cookies {
        SameSite::None
    } else {
        SameSite::Strict
    };

    Cookie::build((config.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(same_site)
        .build()
}

/// Issue a JWT for the given email and set it as an HTTP-only cookie
#[utoipa::path(
    post,
    path = "/auth",
    tag = "auth",
    request_body = SignIn,
    responses(
        (status = 200, description = "Token set in the auth cookie", body = MessageResponse),
        (status = 400, description = "Missing or malformed email", body = ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<SignIn>, AppError>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    request
        .validate()
        .map_err(|_| AppError::Validation("A valid email is required".to_string()))?;
    let email = request
        .email
        .ok_or_else(|| AppError::Validation("A valid email is required".to_string()))?;

    let token = state.services.auth.issue_token(&email)?;
    tracing::debug!("Issued token for {}", email);

    Ok((
        jar.add(auth_cookie(&state, token)),
        MessageResponse::new("JWT token set in cookie"),
    ))
}

/// Clear the auth cookie
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Auth cookie cleared", body = MessageResponse)
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(auth_cookie(&state, String::new())),
        MessageResponse::new("Cookie cleared"),
    )
}
