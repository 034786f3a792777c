use crate::auth::RequestContext;
use crate::role::Capability;
use crate::team::{
    Membership, NewTeam, NewTeamMember, TeamChanges, TeamDetails, TeamService, TeamServiceError,
};
use crate::user::api::v1::UserJson;
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
pub struct TeamMemberJson {
    pub id: i32,
    pub team_id: i32,
    pub user_id: i32,
    pub user: UserJson,
}

impl From<Membership> for TeamMemberJson {
    fn from(membership: Membership) -> Self {
        Self {
            id: membership.member.id,
            team_id: membership.member.team_id,
            user_id: membership.member.user_id,
            user: UserJson::from(membership.user),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamJson {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<FixedOffset>,
    pub members: Vec<TeamMemberJson>,
}

impl From<TeamDetails> for TeamJson {
    fn from(details: TeamDetails) -> Self {
        Self {
            id: details.team.id,
            name: details.team.name,
            created_at: details.team.created_at,
            members: details
                .members
                .into_iter()
                .map(TeamMemberJson::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembersQuery {
    #[serde(default)]
    pub team_id: Option<i32>,
}

impl From<TeamServiceError> for ApiError {
    fn from(err: TeamServiceError) -> Self {
        match err {
            TeamServiceError::MissingField(_) => ApiError::Validation(err.to_string()),
            TeamServiceError::TeamNotFound(_)
            | TeamServiceError::MemberNotFound(_)
            | TeamServiceError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            TeamServiceError::AlreadyMember { .. } => ApiError::Conflict(err.to_string()),
            TeamServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/teams
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/teams",
    responses(
        (status = 200, description = "Teams with their members, newest first", body = [TeamJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Teams"
)]
pub async fn list_teams_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<TeamJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let teams = TeamService::new(&state.db).list_teams().await?;
    Ok(Json(teams.into_iter().map(TeamJson::from).collect()))
}

/// Handler for POST /api/v1/teams
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/teams",
    request_body = NewTeam,
    responses(
        (status = 200, description = "Created team", body = TeamJson),
        (status = 400, description = "Missing name", body = ErrorResponse),
        (status = 404, description = "Unknown member", body = ErrorResponse)
    ),
    tag = "Teams"
)]
pub async fn create_team_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_team), _): WithRejection<Json<NewTeam>, ApiError>,
) -> Result<Json<TeamJson>, ApiError> {
    ctx.require(Capability::ManageTeams)?;
    let team = TeamService::new(&state.db).create_team(new_team).await?;
    Ok(Json(TeamJson::from(team)))
}

/// Handler for GET /api/v1/teams/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/teams/{id}",
    params(("id" = i32, Path, description = "Team id")),
    responses(
        (status = 200, description = "The team", body = TeamJson),
        (status = 404, description = "Unknown team", body = ErrorResponse)
    ),
    tag = "Teams"
)]
pub async fn get_team_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<TeamJson>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let team = TeamService::new(&state.db).get_team(id).await?;
    Ok(Json(TeamJson::from(team)))
}

/// Handler for PUT /api/v1/teams/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/teams/{id}",
    params(("id" = i32, Path, description = "Team id")),
    request_body = TeamChanges,
    responses(
        (status = 200, description = "Updated team", body = TeamJson),
        (status = 400, description = "Blank name", body = ErrorResponse),
        (status = 404, description = "Unknown team or member", body = ErrorResponse)
    ),
    tag = "Teams"
)]
pub async fn update_team_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(changes), _): WithRejection<Json<TeamChanges>, ApiError>,
) -> Result<Json<TeamJson>, ApiError> {
    ctx.require(Capability::ManageTeams)?;
    let team = TeamService::new(&state.db).update_team(id, changes).await?;
    Ok(Json(TeamJson::from(team)))
}

/// Handler for DELETE /api/v1/teams/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/teams/{id}",
    params(("id" = i32, Path, description = "Team id")),
    responses(
        (status = 200, description = "Team deleted", body = SuccessResponse),
        (status = 404, description = "Unknown team", body = ErrorResponse)
    ),
    tag = "Teams"
)]
pub async fn delete_team_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageTeams)?;
    TeamService::new(&state.db).delete_team(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Handler for GET /api/v1/team-members
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/team-members",
    params(("teamId" = Option<i32>, Query, description = "Optional team to filter by")),
    responses(
        (status = 200, description = "Memberships", body = [TeamMemberJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Teams"
)]
pub async fn list_team_members_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<TeamMembersQuery>,
) -> Result<Json<Vec<TeamMemberJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let members = TeamService::new(&state.db)
        .list_members(query.team_id)
        .await?;
    Ok(Json(members.into_iter().map(TeamMemberJson::from).collect()))
}

/// Handler for POST /api/v1/team-members
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/team-members",
    request_body = NewTeamMember,
    responses(
        (status = 200, description = "Created membership", body = TeamMemberJson),
        (status = 400, description = "Missing team or user", body = ErrorResponse),
        (status = 404, description = "Unknown team or user", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    ),
    tag = "Teams"
)]
pub async fn add_team_member_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_member), _): WithRejection<Json<NewTeamMember>, ApiError>,
) -> Result<Json<TeamMemberJson>, ApiError> {
    ctx.require(Capability::ManageTeams)?;
    let member = TeamService::new(&state.db).add_member(new_member).await?;
    Ok(Json(TeamMemberJson::from(member)))
}

/// Handler for GET /api/v1/team-members/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/team-members/{id}",
    params(("id" = i32, Path, description = "Membership id")),
    responses(
        (status = 200, description = "The membership", body = TeamMemberJson),
        (status = 404, description = "Unknown membership", body = ErrorResponse)
    ),
    tag = "Teams"
)]
pub async fn get_team_member_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<TeamMemberJson>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let member = TeamService::new(&state.db).get_member(id).await?;
    Ok(Json(TeamMemberJson::from(member)))
}

/// Handler for DELETE /api/v1/team-members/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/team-members/{id}",
    params(("id" = i32, Path, description = "Membership id")),
    responses(
        (status = 200, description = "Membership removed", body = SuccessResponse),
        (status = 404, description = "Unknown membership", body = ErrorResponse)
    ),
    tag = "Teams"
)]
pub async fn remove_team_member_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageTeams)?;
    TeamService::new(&state.db).remove_member(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Creates and returns the team and team member API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/teams", get(list_teams_handler).post(create_team_handler))
        .route(
            "/teams/{id}",
            get(get_team_handler)
                .put(update_team_handler)
                .patch(update_team_handler)
                .delete(delete_team_handler),
        )
        .route(
            "/team-members",
            get(list_team_members_handler).post(add_team_member_handler),
        )
        .route(
            "/team-members/{id}",
            get(get_team_member_handler).delete(remove_team_member_handler),
        )
        .with_state(state)
}
