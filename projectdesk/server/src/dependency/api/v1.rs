use crate::auth::RequestContext;
use crate::dependency::{Dependency, DependencyService, DependencyServiceError};
use crate::role::Capability;
use crate::task::api::v1::TaskJson;
use crate::web::AppState;
use crate::web::api::v1::{ApiError, ErrorResponse, SuccessResponse, optional_id};
use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::get,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON representation of a dependency edge.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyJson {
    /// Unique identifier of the edge
    pub id: i32,
    /// The task that waits
    pub task_id: i32,
    /// The task that has to be completed first
    pub depends_on: i32,
    /// The task referenced by `dependsOn`
    pub depends: TaskJson,
}

impl From<Dependency> for DependencyJson {
    fn from(dependency: Dependency) -> Self {
        Self {
            id: dependency.id(),
            task_id: dependency.task_id(),
            depends_on: dependency.depends_on(),
            depends: TaskJson::from(dependency.into_depends()),
        }
    }
}

/// Body of `POST /tasks/{id}/dependencies`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddDependencyRequest {
    /// The task the path task should wait on. A number or a numeric string;
    /// `""` and `null` count as missing.
    #[serde(default, deserialize_with = "optional_id")]
    pub depends_on: Option<i32>,
}

/// Body of `DELETE /tasks/{id}/dependencies`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveDependencyRequest {
    /// The edge to delete. Same leniency as `dependsOn`.
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<i32>,
}

/// Project tasks in dependency order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyOrderResponse {
    pub project_id: i32,
    /// Task ids, every dependency ahead of the tasks waiting on it
    pub task_ids: Vec<i32>,
}

impl From<DependencyServiceError> for ApiError {
    fn from(err: DependencyServiceError) -> Self {
        match err {
            DependencyServiceError::MissingDependsOn
            | DependencyServiceError::MissingDependencyId
            | DependencyServiceError::SelfDependency(_)
            | DependencyServiceError::CrossProject { .. } => ApiError::Validation(err.to_string()),
            DependencyServiceError::TaskNotFound(_)
            | DependencyServiceError::ProjectNotFound(_)
            | DependencyServiceError::DependencyNotFound(_) => ApiError::NotFound(err.to_string()),
            DependencyServiceError::DuplicateDependency { .. }
            | DependencyServiceError::Cycle { .. } => ApiError::Conflict(err.to_string()),
            DependencyServiceError::CorruptGraph { .. } | DependencyServiceError::Database(_) => {
                ApiError::internal(err)
            }
        }
    }
}

/// Handler for GET /api/v1/tasks/{id}/dependencies
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}/dependencies",
    params(("id" = i32, Path, description = "The waiting task")),
    responses(
        (status = 200, description = "Edges whose source is the task", body = [DependencyJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Dependencies"
)]
pub async fn list_dependencies_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(task_id): Path<i32>,
) -> Result<Json<Vec<DependencyJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let dependencies = DependencyService::new(&state.db)
        .list_dependencies(task_id)
        .await?;
    Ok(Json(
        dependencies.into_iter().map(DependencyJson::from).collect(),
    ))
}

/// Handler for POST /api/v1/tasks/{id}/dependencies
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/dependencies",
    params(("id" = i32, Path, description = "The waiting task")),
    request_body = AddDependencyRequest,
    responses(
        (status = 200, description = "Created edge", body = DependencyJson),
        (status = 400, description = "Missing, self or cross-project target, or unreadable body", body = ErrorResponse),
        (status = 404, description = "Unknown task", body = ErrorResponse),
        (status = 409, description = "Duplicate edge or dependency cycle", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Dependencies"
)]
pub async fn add_dependency_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(task_id): Path<i32>,
    WithRejection(Json(request), _): WithRejection<Json<AddDependencyRequest>, ApiError>,
) -> Result<Json<DependencyJson>, ApiError> {
    ctx.require(Capability::ManageDependencies)?;
    let dependency = DependencyService::new(&state.db)
        .add_dependency(task_id, request.depends_on)
        .await?;
    Ok(Json(DependencyJson::from(dependency)))
}

/// Handler for DELETE /api/v1/tasks/{id}/dependencies
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}/dependencies",
    params(("id" = i32, Path, description = "The waiting task")),
    request_body = RemoveDependencyRequest,
    responses(
        (status = 200, description = "Edge deleted", body = SuccessResponse),
        (status = 400, description = "Missing edge id or unreadable body", body = ErrorResponse),
        (status = 404, description = "Unknown edge", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Dependencies"
)]
pub async fn remove_dependency_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(task_id): Path<i32>,
    WithRejection(Json(request), _): WithRejection<Json<RemoveDependencyRequest>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageDependencies)?;
    DependencyService::new(&state.db)
        .remove_dependency(task_id, request.id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Handler for GET /api/v1/projects/{id}/dependency-order
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/dependency-order",
    params(("id" = i32, Path, description = "The project")),
    responses(
        (status = 200, description = "Task ids in dependency order", body = DependencyOrderResponse),
        (status = 404, description = "Unknown project", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Dependencies"
)]
pub async fn dependency_order_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(project_id): Path<i32>,
) -> Result<Json<DependencyOrderResponse>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let task_ids = DependencyService::new(&state.db)
        .dependency_order(project_id)
        .await?;
    Ok(Json(DependencyOrderResponse {
        project_id,
        task_ids,
    }))
}

/// Creates and returns the dependency API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/tasks/{id}/dependencies",
            get(list_dependencies_handler)
                .post(add_dependency_handler)
                .delete(remove_dependency_handler),
        )
        .route(
            "/projects/{id}/dependency-order",
            get(dependency_order_handler),
        )
        .with_state(state)
}
