use crate::auth::RequestContext;
use crate::entities::resource;
use crate::resource::{NewResource, ResourceChanges, ResourceService, ResourceServiceError};
use crate::role::Capability;
use crate::web::AppState;
use crate::web::api::v1::{ApiError, ErrorResponse, SuccessResponse};
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::get,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A user's allocation to a project.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceJson {
    pub id: i32,
    pub project_id: i32,
    pub user_id: i32,
    pub allocation_percent: i32,
    pub created_at: DateTime<FixedOffset>,
}

impl From<resource::Model> for ResourceJson {
    fn from(model: resource::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            user_id: model.user_id,
            allocation_percent: model.allocation_percent,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesQuery {
    #[serde(default)]
    pub project_id: Option<i32>,
}

impl From<ResourceServiceError> for ApiError {
    fn from(err: ResourceServiceError) -> Self {
        match err {
            ResourceServiceError::MissingField(_) | ResourceServiceError::InvalidAllocation(_) => {
                ApiError::Validation(err.to_string())
            }
            ResourceServiceError::ResourceNotFound(_)
            | ResourceServiceError::ProjectNotFound(_)
            | ResourceServiceError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            ResourceServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/resources
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/resources",
    params(("projectId" = Option<i32>, Query, description = "Optional project to filter by")),
    responses(
        (status = 200, description = "Allocations, newest first", body = [ResourceJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Resources"
)]
pub async fn list_resources_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ResourcesQuery>,
) -> Result<Json<Vec<ResourceJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let resources = ResourceService::new(&state.db)
        .list_resources(query.project_id)
        .await?;
    Ok(Json(resources.into_iter().map(ResourceJson::from).collect()))
}

/// Handler for POST /api/v1/resources
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/resources",
    request_body = NewResource,
    responses(
        (status = 200, description = "Created allocation", body = ResourceJson),
        (status = 400, description = "Missing field or allocation out of range", body = ErrorResponse),
        (status = 404, description = "Unknown project or user", body = ErrorResponse)
    ),
    tag = "Resources"
)]
pub async fn create_resource_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_resource), _): WithRejection<Json<NewResource>, ApiError>,
) -> Result<Json<ResourceJson>, ApiError> {
    ctx.require(Capability::ManageResources)?;
    let resource = ResourceService::new(&state.db)
        .create_resource(new_resource)
        .await?;
    Ok(Json(ResourceJson::from(resource)))
}

/// Handler for GET /api/v1/resources/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/resources/{id}",
    params(("id" = i32, Path, description = "Resource id")),
    responses(
        (status = 200, description = "The allocation", body = ResourceJson),
        (status = 404, description = "Unknown resource", body = ErrorResponse)
    ),
    tag = "Resources"
)]
pub async fn get_resource_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<ResourceJson>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let resource = ResourceService::new(&state.db).get_resource(id).await?;
    Ok(Json(ResourceJson::from(resource)))
}

/// Handler for PUT /api/v1/resources/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/resources/{id}",
    params(("id" = i32, Path, description = "Resource id")),
    request_body = ResourceChanges,
    responses(
        (status = 200, description = "Updated allocation", body = ResourceJson),
        (status = 400, description = "Allocation out of range", body = ErrorResponse),
        (status = 404, description = "Unknown resource, project or user", body = ErrorResponse)
    ),
    tag = "Resources"
)]
pub async fn update_resource_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(changes), _): WithRejection<Json<ResourceChanges>, ApiError>,
) -> Result<Json<ResourceJson>, ApiError> {
    ctx.require(Capability::ManageResources)?;
    let resource = ResourceService::new(&state.db)
        .update_resource(id, changes)
        .await?;
    Ok(Json(ResourceJson::from(resource)))
}

/// Handler for DELETE /api/v1/resources/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/resources/{id}",
    params(("id" = i32, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Allocation deleted", body = SuccessResponse),
        (status = 404, description = "Unknown resource", body = ErrorResponse)
    ),
    tag = "Resources"
)]
pub async fn delete_resource_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageResources)?;
    ResourceService::new(&state.db).delete_resource(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Creates and returns the resource allocation API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/resources",
            get(list_resources_handler).post(create_resource_handler),
        )
        .route(
            "/resources/{id}",
            get(get_resource_handler)
                .put(update_resource_handler)
                .patch(update_resource_handler)
                .delete(delete_resource_handler),
        )
        .with_state(state)
}
