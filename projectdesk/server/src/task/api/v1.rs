use crate::auth::RequestContext;
use crate::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use crate::entities::task;
use crate::role::Capability;
use crate::task::{NewTask, TaskChanges, TaskService, TaskServiceError};
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

/// JSON representation of a Task for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    pub id: i32,
    pub project_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_id: Option<i32>,
    pub estimated_hours: f64,
    pub spent_hours: f64,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub deliverable_name: Option<String>,
}

impl From<task::Model> for TaskJson {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            title: model.title,
            description: model.description,
            status: model.status,
            priority: model.priority,
            assignee_id: model.assignee_id,
            estimated_hours: model.estimated_hours,
            spent_hours: model.spent_hours,
            start_date: model.start_date,
            due_date: model.due_date,
            deliverable_name: model.deliverable_name,
        }
    }
}

/// Query parameters for filtering tasks by project.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TasksQuery {
    #[serde(default)]
    pub project_id: Option<i32>,
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::MissingField(_) => ApiError::Validation(err.to_string()),
            TaskServiceError::TaskNotFound(_)
            | TaskServiceError::ProjectNotFound(_)
            | TaskServiceError::AssigneeNotFound(_) => ApiError::NotFound(err.to_string()),
            TaskServiceError::HasDependencies { .. } => ApiError::Conflict(err.to_string()),
            TaskServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/tasks
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(("projectId" = Option<i32>, Query, description = "Optional project to filter by")),
    responses(
        (status = 200, description = "Tasks", body = [TaskJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<TasksQuery>,
) -> Result<Json<Vec<TaskJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let tasks = TaskService::new(&state.db)
        .list_tasks(query.project_id)
        .await?;
    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// Handler for POST /api/v1/tasks
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = NewTask,
    responses(
        (status = 200, description = "Created task", body = TaskJson),
        (status = 400, description = "Missing title or project", body = ErrorResponse),
        (status = 404, description = "Unknown project or assignee", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_task), _): WithRejection<Json<NewTask>, ApiError>,
) -> Result<Json<TaskJson>, ApiError> {
    ctx.require(Capability::ManageTasks)?;
    let task = TaskService::new(&state.db).create_task(new_task).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for GET /api/v1/tasks/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = TaskJson),
        (status = 404, description = "Unknown task", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<TaskJson>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let task = TaskService::new(&state.db).get_task(id).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for PUT /api/v1/tasks/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task id")),
    request_body = TaskChanges,
    responses(
        (status = 200, description = "Updated task", body = TaskJson),
        (status = 400, description = "Blank title", body = ErrorResponse),
        (status = 404, description = "Unknown task or assignee", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(changes), _): WithRejection<Json<TaskChanges>, ApiError>,
) -> Result<Json<TaskJson>, ApiError> {
    ctx.require(Capability::ManageTasks)?;
    let task = TaskService::new(&state.db).update_task(id, changes).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /api/v1/tasks/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted", body = SuccessResponse),
        (status = 404, description = "Unknown task", body = ErrorResponse),
        (status = 409, description = "Task still has dependencies", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageTasks)?;
    TaskService::new(&state.db)
        .delete_task(id, state.on_task_delete)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Creates and returns the task API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn unknown_assignee_is_not_found() {
        let err = ApiError::from(TaskServiceError::AssigneeNotFound(42));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Assignee with ID 42 not found");
    }

    #[test]
    fn changes_tell_cleared_fields_from_absent_ones() {
        let changes: TaskChanges =
            serde_json::from_str(r#"{"assigneeId": null, "dueDate": "2025-10-01"}"#).unwrap();

        assert_eq!(changes.assignee_id, Some(None));
        assert_eq!(changes.due_date, Some(NaiveDate::from_ymd_opt(2025, 10, 1)));
        assert_eq!(changes.description, None);
        assert_eq!(changes.title, None);
    }
}
