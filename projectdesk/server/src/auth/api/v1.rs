use crate::auth::{AUTH_COOKIE_NAME, AuthState, encode_jwt};
use crate::role::Role;
use crate::web::api::v1::{ApiError, ErrorResponse};
use axum::{Json, Router, extract::State};
use axum_extra::extract::{CookieJar, WithRejection};
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON request payload for API login
#[derive(serde::Deserialize, Debug, ToSchema)]
pub struct JsonLoginRequest {
    pub email: String,
    pub password: String,
}

/// JSON response for successful API login
#[derive(serde::Serialize, serde::Deserialize, Debug, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// Creates a JSON API router for authentication endpoints.
pub fn create_api_router(state: Arc<AuthState>) -> Router<()> {
    Router::new()
        .route("/login", axum::routing::post(json_login_handler))
        .with_state(state)
}

/// Handles JSON login requests for the bootstrap administrator.
/// Returns the token in the body and also stores it in the `auth_token` cookie.
#[tracing::instrument(skip(state, jar, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = JsonLoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn json_login_handler(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<JsonLoginRequest>, ApiError>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    if payload.email != state.admin_email || payload.password != state.admin_password {
        tracing::info!("Rejected login attempt for {}", payload.email);
        return Err(ApiError::Unauthorized);
    }

    let token =
        encode_jwt(state.admin_user_id, Role::Admin, &state.jwt_secret).map_err(ApiError::internal)?;

    let cookie = Cookie::build((AUTH_COOKIE_NAME, token.clone()))
        .http_only(true)
        .secure(false) // Set to true in production with HTTPS
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(24))
        .path("/")
        .build();

    Ok((jar.add(cookie), Json(LoginResponse { token })))
}
