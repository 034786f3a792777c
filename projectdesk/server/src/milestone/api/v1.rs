use crate::auth::RequestContext;
use crate::entities::milestone;
use crate::milestone::{MilestoneChanges, MilestoneService, MilestoneServiceError, NewMilestone};
use crate::role::Capability;
use crate::web::AppState;
use crate::web::api::v1::{ApiError, ErrorResponse, SuccessResponse};
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::get,
};
use chrono::NaiveDate;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneJson {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub due_date: NaiveDate,
}

impl From<milestone::Model> for MilestoneJson {
    fn from(model: milestone::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            name: model.name,
            due_date: model.due_date,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MilestonesQuery {
    #[serde(default)]
    pub project_id: Option<i32>,
}

impl From<MilestoneServiceError> for ApiError {
    fn from(err: MilestoneServiceError) -> Self {
        match err {
            MilestoneServiceError::MissingField(_) => ApiError::Validation(err.to_string()),
            MilestoneServiceError::MilestoneNotFound(_)
            | MilestoneServiceError::ProjectNotFound(_) => ApiError::NotFound(err.to_string()),
            MilestoneServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/milestones
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/milestones",
    params(("projectId" = Option<i32>, Query, description = "Optional project to filter by")),
    responses(
        (status = 200, description = "Milestones by due date", body = [MilestoneJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Milestones"
)]
pub async fn list_milestones_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<MilestonesQuery>,
) -> Result<Json<Vec<MilestoneJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let milestones = MilestoneService::new(&state.db)
        .list_milestones(query.project_id)
        .await?;
    Ok(Json(milestones.into_iter().map(MilestoneJson::from).collect()))
}

/// Handler for POST /api/v1/milestones
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/milestones",
    request_body = NewMilestone,
    responses(
        (status = 200, description = "Created milestone", body = MilestoneJson),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 404, description = "Unknown project", body = ErrorResponse)
    ),
    tag = "Milestones"
)]
pub async fn create_milestone_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_milestone), _): WithRejection<Json<NewMilestone>, ApiError>,
) -> Result<Json<MilestoneJson>, ApiError> {
    ctx.require(Capability::ManageMilestones)?;
    let milestone = MilestoneService::new(&state.db)
        .create_milestone(new_milestone)
        .await?;
    Ok(Json(MilestoneJson::from(milestone)))
}

/// Handler for GET /api/v1/milestones/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/milestones/{id}",
    params(("id" = i32, Path, description = "Milestone id")),
    responses(
        (status = 200, description = "The milestone", body = MilestoneJson),
        (status = 404, description = "Unknown milestone", body = ErrorResponse)
    ),
    tag = "Milestones"
)]
pub async fn get_milestone_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<MilestoneJson>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let milestone = MilestoneService::new(&state.db).get_milestone(id).await?;
    Ok(Json(MilestoneJson::from(milestone)))
}

/// Handler for PUT /api/v1/milestones/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/milestones/{id}",
    params(("id" = i32, Path, description = "Milestone id")),
    request_body = MilestoneChanges,
    responses(
        (status = 200, description = "Updated milestone", body = MilestoneJson),
        (status = 404, description = "Unknown milestone", body = ErrorResponse)
    ),
    tag = "Milestones"
)]
pub async fn update_milestone_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(changes), _): WithRejection<Json<MilestoneChanges>, ApiError>,
) -> Result<Json<MilestoneJson>, ApiError> {
    ctx.require(Capability::ManageMilestones)?;
    let milestone = MilestoneService::new(&state.db)
        .update_milestone(id, changes)
        .await?;
    Ok(Json(MilestoneJson::from(milestone)))
}

/// Handler for DELETE /api/v1/milestones/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/milestones/{id}",
    params(("id" = i32, Path, description = "Milestone id")),
    responses(
        (status = 200, description = "Milestone deleted", body = SuccessResponse),
        (status = 404, description = "Unknown milestone", body = ErrorResponse)
    ),
    tag = "Milestones"
)]
pub async fn delete_milestone_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageMilestones)?;
    MilestoneService::new(&state.db).delete_milestone(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Creates and returns the milestone API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/milestones",
            get(list_milestones_handler).post(create_milestone_handler),
        )
        .route(
            "/milestones/{id}",
            get(get_milestone_handler)
                .put(update_milestone_handler)
                .delete(delete_milestone_handler),
        )
        .with_state(state)
}
