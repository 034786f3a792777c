use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use jsonwebtoken::encode;
use std::sync::Arc;

use crate::config::Config;
use crate::role::{Capability, Role};
use crate::web::api::v1::ApiError;

pub mod api;

pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// Authenticated caller of the current request.
///
/// Inserted into the request extensions by [`auth_user_middleware`] and passed
/// to handlers as an extractor; nothing reads the caller from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i32,
    pub role: Role,
}

impl RequestContext {
    pub fn new(user_id: i32, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Fails with [`ApiError::Forbidden`] unless the caller's role grants `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.role.can(capability) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.user_id,
                role = ?self.role,
                ?capability,
                "Capability check failed"
            );
            Err(ApiError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .copied()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Authentication state containing the bootstrap admin credentials and JWT secret.
#[derive(Clone)]
pub struct AuthState {
    pub admin_email: String,
    pub admin_password: String,
    pub admin_user_id: i32,
    pub jwt_secret: String,
}

impl AuthState {
    /// Creates a new AuthState from the application config and the stored admin user.
    pub fn from_config(config: &Config, admin_user_id: i32) -> Self {
        Self {
            admin_email: config.admin_email.clone(),
            admin_password: config.admin_password.clone(),
            admin_user_id,
            jwt_secret: config.jwt_secret.clone(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub exp: usize,   // Expiry time of the token
    pub iat: usize,   // Issued at time of the token
    pub user_id: i32, // Id of the authenticated user
    pub role: Role,
}

/// Authentication middleware that checks for a valid JWT and sets the RequestContext extension.
///
/// The token is read from the `Authorization: Bearer` header, falling back to the
/// `auth_token` cookie. This middleware never rejects a request.
pub async fn auth_user_middleware(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(&headers)
        .map(str::to_owned)
        .or_else(|| jar.get(AUTH_COOKIE_NAME).map(|c| c.value().to_owned()));

    if let Some(token) = token {
        match decode_jwt(&token, &state.jwt_secret) {
            Ok(claims) => {
                request
                    .extensions_mut()
                    .insert(RequestContext::new(claims.user_id, claims.role));
            }
            Err(err) => tracing::debug!("Ignoring invalid auth token: {}", err),
        }
    }

    next.run(request).await
}

/// Middleware that ensures the current user is authenticated.
/// Returns UNAUTHORIZED if the RequestContext extension is not found in the request.
/// This middleware should be applied after auth_user_middleware.
pub async fn require_auth_middleware(request: Request, next: Next) -> Response {
    let is_authenticated = request.extensions().get::<RequestContext>().is_some();

    if !is_authenticated {
        return ApiError::Unauthorized.into_response();
    }

    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub fn encode_jwt(user_id: i32, role: Role, jwt_secret: &str) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(24);
    let exp = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims {
        exp,
        iat,
        user_id,
        role,
    };
    let jwt = encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

pub fn decode_jwt(token: &str, jwt_secret: &str) -> anyhow::Result<Claims> {
    let token_data = jsonwebtoken::decode(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::{from_fn, from_fn_with_state};
    use tower::ServiceExt;

    fn test_auth_state() -> Arc<AuthState> {
        Arc::new(AuthState {
            admin_email: "admin@example.com".to_string(),
            admin_password: "password".to_string(),
            admin_user_id: 1,
            jwt_secret: "test_secret".to_string(),
        })
    }

    fn whoami_app(auth_state: Arc<AuthState>) -> axum::Router {
        // Layers are applied in reverse order (bottom to top)
        axum::Router::new()
            .route(
                "/whoami",
                axum::routing::get(|ctx: RequestContext| async move {
                    format!("{}:{:?}", ctx.user_id, ctx.role)
                }),
            )
            .layer(from_fn(require_auth_middleware))
            .layer(from_fn_with_state(auth_state, auth_user_middleware))
    }

    async fn body_text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[test]
    fn can_round_trip_claims() {
        let token = encode_jwt(7, Role::ProjectManager, "secret").unwrap();
        let claims = decode_jwt(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, Role::ProjectManager);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = encode_jwt(7, Role::Admin, "secret").unwrap();
        assert!(decode_jwt(&token, "another").is_err());
    }

    #[test]
    fn client_cannot_manage_projects() {
        let ctx = RequestContext::new(3, Role::Client);
        assert!(ctx.require(Capability::ViewProjects).is_ok());
        assert!(matches!(
            ctx.require(Capability::ManageProjects),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn rejects_unauthenticated_request() {
        let app = whoami_app(test_auth_state());

        let response = app
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn can_authenticate_with_bearer_token() {
        let auth_state = test_auth_state();
        let token = encode_jwt(42, Role::TeamMember, &auth_state.jwt_secret).unwrap();
        let app = whoami_app(auth_state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "42:TeamMember");
    }

    #[tokio::test]
    async fn can_authenticate_with_cookie() {
        let auth_state = test_auth_state();
        let token = encode_jwt(1, Role::Admin, &auth_state.jwt_secret).unwrap();
        let app = whoami_app(auth_state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("cookie", format!("{}={}", AUTH_COOKIE_NAME, token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "1:Admin");
    }

    #[tokio::test]
    async fn ignores_garbage_token() {
        let app = whoami_app(test_auth_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
