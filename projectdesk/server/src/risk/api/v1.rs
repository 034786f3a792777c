use crate::auth::RequestContext;
use crate::entities::risk;
use crate::entities::sea_orm_active_enums::{RiskSeverity, RiskStatus};
use crate::risk::{NewRisk, RiskChanges, RiskService, RiskServiceError};
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

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskJson {
    pub id: i32,
    pub project_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub severity: RiskSeverity,
    pub mitigation_plan: Option<String>,
    pub status: RiskStatus,
    pub reported_by_id: i32,
    pub created_at: DateTime<FixedOffset>,
}

impl From<risk::Model> for RiskJson {
    fn from(model: risk::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            title: model.title,
            description: model.description,
            severity: model.severity,
            mitigation_plan: model.mitigation_plan,
            status: model.status,
            reported_by_id: model.reported_by_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RisksQuery {
    #[serde(default)]
    pub project_id: Option<i32>,
}

impl From<RiskServiceError> for ApiError {
    fn from(err: RiskServiceError) -> Self {
        match err {
            RiskServiceError::MissingField(_) => ApiError::Validation(err.to_string()),
            RiskServiceError::RiskNotFound(_)
            | RiskServiceError::ProjectNotFound(_)
            | RiskServiceError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            RiskServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/risks
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/risks",
    params(("projectId" = Option<i32>, Query, description = "Optional project to filter by")),
    responses(
        (status = 200, description = "Risks, most severe first", body = [RiskJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Risks"
)]
pub async fn list_risks_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<RisksQuery>,
) -> Result<Json<Vec<RiskJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let risks = RiskService::new(&state.db).list_risks(query.project_id).await?;
    Ok(Json(risks.into_iter().map(RiskJson::from).collect()))
}

/// Handler for POST /api/v1/risks
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/risks",
    request_body = NewRisk,
    responses(
        (status = 200, description = "Recorded risk", body = RiskJson),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 404, description = "Unknown project or reporter", body = ErrorResponse)
    ),
    tag = "Risks"
)]
pub async fn create_risk_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_risk), _): WithRejection<Json<NewRisk>, ApiError>,
) -> Result<Json<RiskJson>, ApiError> {
    ctx.require(Capability::ManageRisks)?;
    let risk = RiskService::new(&state.db)
        .create_risk(ctx.user_id, new_risk)
        .await?;
    Ok(Json(RiskJson::from(risk)))
}

/// Handler for GET /api/v1/risks/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/risks/{id}",
    params(("id" = i32, Path, description = "Risk id")),
    responses(
        (status = 200, description = "The risk", body = RiskJson),
        (status = 404, description = "Unknown risk", body = ErrorResponse)
    ),
    tag = "Risks"
)]
pub async fn get_risk_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<RiskJson>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let risk = RiskService::new(&state.db).get_risk(id).await?;
    Ok(Json(RiskJson::from(risk)))
}

/// Handler for PUT /api/v1/risks/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/risks/{id}",
    params(("id" = i32, Path, description = "Risk id")),
    request_body = RiskChanges,
    responses(
        (status = 200, description = "Updated risk", body = RiskJson),
        (status = 400, description = "Blank title", body = ErrorResponse),
        (status = 404, description = "Unknown risk", body = ErrorResponse)
    ),
    tag = "Risks"
)]
pub async fn update_risk_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(changes), _): WithRejection<Json<RiskChanges>, ApiError>,
) -> Result<Json<RiskJson>, ApiError> {
    ctx.require(Capability::ManageRisks)?;
    let risk = RiskService::new(&state.db).update_risk(id, changes).await?;
    Ok(Json(RiskJson::from(risk)))
}

/// Handler for DELETE /api/v1/risks/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/risks/{id}",
    params(("id" = i32, Path, description = "Risk id")),
    responses(
        (status = 200, description = "Risk deleted", body = SuccessResponse),
        (status = 404, description = "Unknown risk", body = ErrorResponse)
    ),
    tag = "Risks"
)]
pub async fn delete_risk_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageRisks)?;
    RiskService::new(&state.db).delete_risk(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Creates and returns the risk API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/risks", get(list_risks_handler).post(create_risk_handler))
        .route(
            "/risks/{id}",
            get(get_risk_handler)
                .put(update_risk_handler)
                .patch(update_risk_handler)
                .delete(delete_risk_handler),
        )
        .with_state(state)
}
