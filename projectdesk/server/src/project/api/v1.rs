use crate::auth::RequestContext;
use crate::entities::project;
use crate::milestone::api::v1::MilestoneJson;
use crate::project::{
    NewProject, ProjectChanges, ProjectDetails, ProjectService, ProjectServiceError,
};
use crate::role::Capability;
use crate::task::api::v1::TaskJson;
use crate::web::AppState;
use crate::web::api::v1::{ApiError, ErrorResponse, SuccessResponse};
use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::get,
};
use chrono::NaiveDate;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON representation of a Project for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectJson {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i32,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub budgeted_cost: f64,
}

impl From<project::Model> for ProjectJson {
    fn from(model: project::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            owner_id: model.owner_id,
            start_date: model.start_date,
            due_date: model.due_date,
            budgeted_cost: model.budgeted_cost,
        }
    }
}

/// A project with its tasks and milestones.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailsJson {
    #[serde(flatten)]
    pub project: ProjectJson,
    pub tasks: Vec<TaskJson>,
    pub milestones: Vec<MilestoneJson>,
}

impl From<ProjectDetails> for ProjectDetailsJson {
    fn from(details: ProjectDetails) -> Self {
        Self {
            project: ProjectJson::from(details.project),
            tasks: details.tasks.into_iter().map(TaskJson::from).collect(),
            milestones: details
                .milestones
                .into_iter()
                .map(MilestoneJson::from)
                .collect(),
        }
    }
}

impl From<ProjectServiceError> for ApiError {
    fn from(err: ProjectServiceError) -> Self {
        match err {
            ProjectServiceError::MissingName => ApiError::Validation(err.to_string()),
            ProjectServiceError::ProjectNotFound(_) => ApiError::NotFound(err.to_string()),
            ProjectServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/projects
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    responses(
        (status = 200, description = "All projects", body = [ProjectJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn list_projects_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<ProjectJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let projects = ProjectService::new(&state.db).list_projects().await?;
    Ok(Json(projects.into_iter().map(ProjectJson::from).collect()))
}

/// Handler for POST /api/v1/projects
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = NewProject,
    responses(
        (status = 200, description = "Created project", body = ProjectJson),
        (status = 400, description = "Missing name", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn create_project_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_project), _): WithRejection<Json<NewProject>, ApiError>,
) -> Result<Json<ProjectJson>, ApiError> {
    ctx.require(Capability::ManageProjects)?;
    let project = ProjectService::new(&state.db)
        .create_project(ctx.user_id, new_project)
        .await?;
    Ok(Json(ProjectJson::from(project)))
}

/// Handler for GET /api/v1/projects/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = i32, Path, description = "Project id")),
    responses(
        (status = 200, description = "The project with its tasks and milestones", body = ProjectDetailsJson),
        (status = 404, description = "Unknown project", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn get_project_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<ProjectDetailsJson>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let details = ProjectService::new(&state.db)
        .get_project_details(id)
        .await?;
    Ok(Json(ProjectDetailsJson::from(details)))
}

/// Handler for PUT /api/v1/projects/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    params(("id" = i32, Path, description = "Project id")),
    request_body = ProjectChanges,
    responses(
        (status = 200, description = "Updated project", body = ProjectJson),
        (status = 404, description = "Unknown project", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn update_project_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(changes), _): WithRejection<Json<ProjectChanges>, ApiError>,
) -> Result<Json<ProjectJson>, ApiError> {
    ctx.require(Capability::ManageProjects)?;
    let project = ProjectService::new(&state.db)
        .update_project(id, changes)
        .await?;
    Ok(Json(ProjectJson::from(project)))
}

/// Handler for DELETE /api/v1/projects/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(("id" = i32, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = SuccessResponse),
        (status = 404, description = "Unknown project", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn delete_project_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageProjects)?;
    ProjectService::new(&state.db).delete_project(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Creates and returns the project API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/projects",
            get(list_projects_handler).post(create_project_handler),
        )
        .route(
            "/projects/{id}",
            get(get_project_handler)
                .put(update_project_handler)
                .delete(delete_project_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn missing_name_is_a_validation_error() {
        let err = ApiError::from(ProjectServiceError::MissingName);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Project name is required");
    }

    #[test]
    fn details_flatten_the_project_fields() {
        let details = ProjectDetailsJson {
            project: ProjectJson {
                id: 3,
                name: "Bridge".to_string(),
                description: None,
                owner_id: 1,
                start_date: None,
                due_date: None,
                budgeted_cost: 1500.0,
            },
            tasks: vec![],
            milestones: vec![],
        };

        insta::assert_json_snapshot!(details, @r#"
        {
          "id": 3,
          "name": "Bridge",
          "description": null,
          "ownerId": 1,
          "startDate": null,
          "dueDate": null,
          "budgetedCost": 1500.0,
          "tasks": [],
          "milestones": []
        }
        "#);
    }
}
