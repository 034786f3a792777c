//! Role dashboards.
//!
//! Each role has exactly one dashboard inside its own area. Requests for
//! another role's area are redirected to the caller's dashboard.

use crate::auth::{RequestContext, require_auth_middleware};
use crate::role::{NavItem, Role};
use axum::{
    Json, Router,
    extract::Request,
    middleware::{Next, from_fn},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Serialize;

/// JSON body of a role dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub role: Role,
    pub navigation: &'static [NavItem],
}

impl DashboardResponse {
    pub fn for_role(role: Role) -> Self {
        Self {
            role,
            navigation: role.navigation(),
        }
    }
}

/// Sends the caller to its own dashboard.
#[tracing::instrument]
pub async fn dashboard_redirect_handler(ctx: RequestContext) -> Redirect {
    Redirect::to(ctx.role.dashboard_path())
}

#[tracing::instrument]
pub async fn role_dashboard_handler(ctx: RequestContext) -> Json<DashboardResponse> {
    Json(DashboardResponse::for_role(ctx.role))
}

/// Redirects callers that wander into another role's area.
///
/// Requests without a [`RequestContext`] pass through untouched.
pub async fn role_area_middleware(request: Request, next: Next) -> Response {
    let redirect = request
        .extensions()
        .get::<RequestContext>()
        .and_then(|ctx| ctx.role.redirect_for(request.uri().path()));

    if let Some(target) = redirect {
        tracing::debug!("Redirecting {} to {}", request.uri().path(), target);
        return Redirect::to(target).into_response();
    }

    next.run(request).await
}

/// Creates the dashboard router. Every route requires authentication.
pub fn create_router() -> Router {
    let mut router = Router::new().route("/dashboard", get(dashboard_redirect_handler));
    for role in Role::ALL {
        router = router.route(role.dashboard_path(), get(role_dashboard_handler));
    }

    // Layers are applied in reverse order (bottom to top)
    router
        .layer(from_fn(role_area_middleware))
        .layer(from_fn(require_auth_middleware))
}
