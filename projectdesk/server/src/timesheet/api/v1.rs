use crate::auth::RequestContext;
use crate::entities::timesheet;
use crate::role::Capability;
use crate::timesheet::{NewTimesheet, TimesheetChanges, TimesheetService, TimesheetServiceError};
use crate::web::AppState;
use crate::web::api::v1::{ApiError, ErrorResponse, SuccessResponse};
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::get,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetJson {
    pub id: i32,
    pub task_id: i32,
    pub user_id: i32,
    pub minutes: i32,
    pub description: Option<String>,
    pub is_billable: bool,
    pub date: NaiveDate,
}

impl From<timesheet::Model> for TimesheetJson {
    fn from(model: timesheet::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            user_id: model.user_id,
            minutes: model.minutes,
            description: model.description,
            is_billable: model.is_billable,
            date: model.date,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetsQuery {
    #[serde(default)]
    pub task_id: Option<i32>,
}

impl From<TimesheetServiceError> for ApiError {
    fn from(err: TimesheetServiceError) -> Self {
        match err {
            TimesheetServiceError::MissingField(_) | TimesheetServiceError::InvalidMinutes(_) => {
                ApiError::Validation(err.to_string())
            }
            TimesheetServiceError::TimesheetNotFound(_)
            | TimesheetServiceError::TaskNotFound(_)
            | TimesheetServiceError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            TimesheetServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/timesheets
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/timesheets",
    params(("taskId" = Option<i32>, Query, description = "Optional task to filter by")),
    responses(
        (status = 200, description = "Entries, most recent day first", body = [TimesheetJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Timesheets"
)]
pub async fn list_timesheets_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<TimesheetsQuery>,
) -> Result<Json<Vec<TimesheetJson>>, ApiError> {
    ctx.require(Capability::LogTime)?;
    let entries = TimesheetService::new(&state.db)
        .list_timesheets(query.task_id)
        .await?;
    Ok(Json(entries.into_iter().map(TimesheetJson::from).collect()))
}

/// Handler for POST /api/v1/timesheets
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/timesheets",
    request_body = NewTimesheet,
    responses(
        (status = 200, description = "Logged entry", body = TimesheetJson),
        (status = 400, description = "Missing task or invalid minutes", body = ErrorResponse),
        (status = 404, description = "Unknown task or user", body = ErrorResponse)
    ),
    tag = "Timesheets"
)]
pub async fn log_time_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_timesheet), _): WithRejection<Json<NewTimesheet>, ApiError>,
) -> Result<Json<TimesheetJson>, ApiError> {
    ctx.require(Capability::LogTime)?;
    let entry = TimesheetService::new(&state.db)
        .log_time(ctx.user_id, new_timesheet)
        .await?;
    Ok(Json(TimesheetJson::from(entry)))
}

/// Handler for GET /api/v1/timesheets/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/timesheets/{id}",
    params(("id" = i32, Path, description = "Timesheet id")),
    responses(
        (status = 200, description = "The entry", body = TimesheetJson),
        (status = 404, description = "Unknown entry", body = ErrorResponse)
    ),
    tag = "Timesheets"
)]
pub async fn get_timesheet_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<TimesheetJson>, ApiError> {
    ctx.require(Capability::LogTime)?;
    let entry = TimesheetService::new(&state.db).get_timesheet(id).await?;
    Ok(Json(TimesheetJson::from(entry)))
}

/// Handler for PUT /api/v1/timesheets/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/timesheets/{id}",
    params(("id" = i32, Path, description = "Timesheet id")),
    request_body = TimesheetChanges,
    responses(
        (status = 200, description = "Updated entry", body = TimesheetJson),
        (status = 400, description = "Invalid minutes", body = ErrorResponse),
        (status = 404, description = "Unknown entry", body = ErrorResponse)
    ),
    tag = "Timesheets"
)]
pub async fn update_timesheet_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(changes), _): WithRejection<Json<TimesheetChanges>, ApiError>,
) -> Result<Json<TimesheetJson>, ApiError> {
    ctx.require(Capability::LogTime)?;
    let entry = TimesheetService::new(&state.db)
        .update_timesheet(id, changes)
        .await?;
    Ok(Json(TimesheetJson::from(entry)))
}

/// Handler for DELETE /api/v1/timesheets/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/timesheets/{id}",
    params(("id" = i32, Path, description = "Timesheet id")),
    responses(
        (status = 200, description = "Entry deleted", body = SuccessResponse),
        (status = 404, description = "Unknown entry", body = ErrorResponse)
    ),
    tag = "Timesheets"
)]
pub async fn delete_timesheet_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::LogTime)?;
    TimesheetService::new(&state.db)
        .delete_timesheet(id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Creates and returns the timesheet API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/timesheets",
            get(list_timesheets_handler).post(log_time_handler),
        )
        .route(
            "/timesheets/{id}",
            get(get_timesheet_handler)
                .put(update_timesheet_handler)
                .patch(update_timesheet_handler)
                .delete(delete_timesheet_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_minutes_are_a_validation_error() {
        let err = ApiError::from(TimesheetServiceError::InvalidMinutes(0));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "minutes must be positive, got 0");
    }
}
