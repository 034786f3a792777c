use crate::auth::{RequestContext, encode_jwt};
use crate::auth::api::v1::LoginResponse;
use crate::entities::user;
use crate::role::{Capability, Role};
use crate::user::{NewUser, UserService, UserServiceError};
use crate::web::AppState;
use crate::web::api::v1::{ApiError, ErrorResponse};
use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON representation of a User for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserJson {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<user::Model> for UserJson {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::MissingField(_) => ApiError::Validation(err.to_string()),
            UserServiceError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            UserServiceError::DuplicateEmail(_) => ApiError::Conflict(err.to_string()),
            UserServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/admin/users
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses(
        (status = 200, description = "All users", body = [UserJson]),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn list_users_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<UserJson>>, ApiError> {
    ctx.require(Capability::ManageUsers)?;
    let users = UserService::new(&state.db).list_users().await?;
    Ok(Json(users.into_iter().map(UserJson::from).collect()))
}

/// Handler for POST /api/v1/admin/users
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/admin/users",
    request_body = NewUser,
    responses(
        (status = 200, description = "Created user", body = UserJson),
        (status = 400, description = "Missing name or email", body = ErrorResponse),
        (status = 409, description = "Email already taken", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn create_user_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_user), _): WithRejection<Json<NewUser>, ApiError>,
) -> Result<Json<UserJson>, ApiError> {
    ctx.require(Capability::ManageUsers)?;
    let user = UserService::new(&state.db).create_user(new_user).await?;
    Ok(Json(UserJson::from(user)))
}

/// Handler for PUT /api/v1/admin/users/{id}/role
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated user", body = UserJson),
        (status = 404, description = "Unknown user", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn update_role_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateRoleRequest>, ApiError>,
) -> Result<Json<UserJson>, ApiError> {
    ctx.require(Capability::ManageUsers)?;
    let user = UserService::new(&state.db)
        .update_role(id, request.role)
        .await?;
    Ok(Json(UserJson::from(user)))
}

/// Handler for POST /api/v1/admin/users/{id}/token
///
/// Issues a token carrying the user's current role.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/token",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Token for the user", body = LoginResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn issue_token_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<LoginResponse>, ApiError> {
    ctx.require(Capability::ManageUsers)?;
    let user = UserService::new(&state.db).get_user(id).await?;
    let token =
        encode_jwt(user.id, user.role, &state.auth.jwt_secret).map_err(ApiError::internal)?;
    tracing::info!("Issued token for user {} ({:?})", user.id, user.role);
    Ok(Json(LoginResponse { token }))
}

/// Creates and returns the user administration API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/admin/users",
            get(list_users_handler).post(create_user_handler),
        )
        .route("/admin/users/{id}/role", put(update_role_handler))
        .route("/admin/users/{id}/token", post(issue_token_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn duplicate_email_is_a_conflict() {
        let err = ApiError::from(UserServiceError::DuplicateEmail("a@b.c".to_string()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn can_parse_role_update() {
        let request: UpdateRoleRequest =
            serde_json::from_str(r#"{"role":"PROJECT_MANAGER"}"#).unwrap();
        assert_eq!(request.role, Role::ProjectManager);
    }
}
