use axum::{Router, middleware::from_fn};
use tower::ServiceBuilder;
use utoipa::OpenApi;

use crate::auth::{self, require_auth_middleware};
use crate::web::AppState;
use crate::{
    attachment, comment, dependency, milestone, project, resource, risk, task, team, timesheet,
    user,
};

pub mod v1;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::api::v1::json_login_handler,
        project::api::v1::list_projects_handler,
        project::api::v1::create_project_handler,
        project::api::v1::get_project_handler,
        project::api::v1::update_project_handler,
        project::api::v1::delete_project_handler,
        task::api::v1::list_tasks_handler,
        task::api::v1::create_task_handler,
        task::api::v1::get_task_handler,
        task::api::v1::update_task_handler,
        task::api::v1::delete_task_handler,
        dependency::api::v1::list_dependencies_handler,
        dependency::api::v1::add_dependency_handler,
        dependency::api::v1::remove_dependency_handler,
        dependency::api::v1::dependency_order_handler,
        milestone::api::v1::list_milestones_handler,
        milestone::api::v1::create_milestone_handler,
        milestone::api::v1::get_milestone_handler,
        milestone::api::v1::update_milestone_handler,
        milestone::api::v1::delete_milestone_handler,
        user::api::v1::list_users_handler,
        user::api::v1::create_user_handler,
        user::api::v1::update_role_handler,
        user::api::v1::issue_token_handler,
        risk::api::v1::list_risks_handler,
        risk::api::v1::create_risk_handler,
        risk::api::v1::get_risk_handler,
        risk::api::v1::update_risk_handler,
        risk::api::v1::delete_risk_handler,
        resource::api::v1::list_resources_handler,
        resource::api::v1::create_resource_handler,
        resource::api::v1::get_resource_handler,
        resource::api::v1::update_resource_handler,
        resource::api::v1::delete_resource_handler,
        team::api::v1::list_teams_handler,
        team::api::v1::create_team_handler,
        team::api::v1::get_team_handler,
        team::api::v1::update_team_handler,
        team::api::v1::delete_team_handler,
        team::api::v1::list_team_members_handler,
        team::api::v1::add_team_member_handler,
        team::api::v1::get_team_member_handler,
        team::api::v1::remove_team_member_handler,
        comment::api::v1::list_comments_handler,
        comment::api::v1::create_comment_handler,
        comment::api::v1::get_comment_handler,
        comment::api::v1::update_comment_handler,
        comment::api::v1::delete_comment_handler,
        attachment::api::v1::list_attachments_handler,
        attachment::api::v1::create_attachment_handler,
        attachment::api::v1::get_attachment_handler,
        attachment::api::v1::update_attachment_handler,
        attachment::api::v1::delete_attachment_handler,
        timesheet::api::v1::list_timesheets_handler,
        timesheet::api::v1::log_time_handler,
        timesheet::api::v1::get_timesheet_handler,
        timesheet::api::v1::update_timesheet_handler,
        timesheet::api::v1::delete_timesheet_handler,
    ),
    tags(
        (name = "Auth", description = "Sign-in"),
        (name = "Projects", description = "Projects"),
        (name = "Tasks", description = "Tasks"),
        (name = "Dependencies", description = "Task dependencies"),
        (name = "Milestones", description = "Project milestones"),
        (name = "Users", description = "User administration"),
        (name = "Risks", description = "Project risks"),
        (name = "Resources", description = "Resource allocation"),
        (name = "Teams", description = "Teams and memberships"),
        (name = "Comments", description = "Comments"),
        (name = "Attachments", description = "Attachment metadata"),
        (name = "Timesheets", description = "Time tracking"),
    )
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints.
///
/// Everything but `/login` requires an authenticated caller.
pub fn create_api_router(state: AppState) -> Router {
    let login_router = auth::api::v1::create_api_router(state.auth.clone());

    let protected_routes = Router::new()
        .merge(project::api::v1::create_api_router(state.clone()))
        .merge(task::api::v1::create_api_router(state.clone()))
        .merge(dependency::api::v1::create_api_router(state.clone()))
        .merge(milestone::api::v1::create_api_router(state.clone()))
        .merge(user::api::v1::create_api_router(state.clone()))
        .merge(risk::api::v1::create_api_router(state.clone()))
        .merge(resource::api::v1::create_api_router(state.clone()))
        .merge(team::api::v1::create_api_router(state.clone()))
        .merge(comment::api::v1::create_api_router(state.clone()))
        .merge(attachment::api::v1::create_api_router(state.clone()))
        .merge(timesheet::api::v1::create_api_router(state))
        .layer(ServiceBuilder::new().layer(from_fn(require_auth_middleware)));

    Router::new().nest("/api/v1", login_router.merge(protected_routes))
}
