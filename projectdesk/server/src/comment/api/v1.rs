use crate::attachment::api::v1::AttachmentJson;
use crate::auth::RequestContext;
use crate::comment::{
    CommentChanges, CommentDetails, CommentService, CommentServiceError, NewComment,
};
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
pub struct CommentJson {
    pub id: i32,
    pub content: String,
    pub user_id: i32,
    pub project_id: Option<i32>,
    pub task_id: Option<i32>,
    pub created_at: DateTime<FixedOffset>,
    pub attachments: Vec<AttachmentJson>,
}

impl From<CommentDetails> for CommentJson {
    fn from(details: CommentDetails) -> Self {
        let comment = details.comment;
        Self {
            id: comment.id,
            content: comment.content,
            user_id: comment.user_id,
            project_id: comment.project_id,
            task_id: comment.task_id,
            created_at: comment.created_at,
            attachments: details
                .attachments
                .into_iter()
                .map(AttachmentJson::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    #[serde(default)]
    pub project_id: Option<i32>,
    #[serde(default)]
    pub task_id: Option<i32>,
}

impl From<CommentServiceError> for ApiError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::MissingField(_) | CommentServiceError::TaskNotInProject { .. } => {
                ApiError::Validation(err.to_string())
            }
            CommentServiceError::CommentNotFound(_)
            | CommentServiceError::ProjectNotFound(_)
            | CommentServiceError::TaskNotFound(_) => ApiError::NotFound(err.to_string()),
            CommentServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/comments
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/comments",
    params(
        ("projectId" = Option<i32>, Query, description = "Optional project to filter by"),
        ("taskId" = Option<i32>, Query, description = "Optional task to filter by")
    ),
    responses(
        (status = 200, description = "Comments, newest first", body = [CommentJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn list_comments_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<Vec<CommentJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let comments = CommentService::new(&state.db)
        .list_comments(query.project_id, query.task_id)
        .await?;
    Ok(Json(comments.into_iter().map(CommentJson::from).collect()))
}

/// Handler for POST /api/v1/comments
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/comments",
    request_body = NewComment,
    responses(
        (status = 200, description = "Created comment", body = CommentJson),
        (status = 400, description = "Missing content or mismatched task", body = ErrorResponse),
        (status = 404, description = "Unknown project or task", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn create_comment_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_comment), _): WithRejection<Json<NewComment>, ApiError>,
) -> Result<Json<CommentJson>, ApiError> {
    ctx.require(Capability::ManageComments)?;
    let comment = CommentService::new(&state.db)
        .create_comment(ctx.user_id, new_comment)
        .await?;
    Ok(Json(CommentJson::from(comment)))
}

/// Handler for GET /api/v1/comments/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/comments/{id}",
    params(("id" = i32, Path, description = "Comment id")),
    responses(
        (status = 200, description = "The comment", body = CommentJson),
        (status = 404, description = "Unknown comment", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn get_comment_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<CommentJson>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let comment = CommentService::new(&state.db).get_comment(id).await?;
    Ok(Json(CommentJson::from(comment)))
}

/// Handler for PUT /api/v1/comments/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/comments/{id}",
    params(("id" = i32, Path, description = "Comment id")),
    request_body = CommentChanges,
    responses(
        (status = 200, description = "Updated comment", body = CommentJson),
        (status = 400, description = "Blank content", body = ErrorResponse),
        (status = 404, description = "Unknown comment", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn update_comment_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(changes), _): WithRejection<Json<CommentChanges>, ApiError>,
) -> Result<Json<CommentJson>, ApiError> {
    ctx.require(Capability::ManageComments)?;
    let comment = CommentService::new(&state.db)
        .update_comment(id, changes)
        .await?;
    Ok(Json(CommentJson::from(comment)))
}

/// Handler for DELETE /api/v1/comments/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    params(("id" = i32, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment deleted", body = SuccessResponse),
        (status = 404, description = "Unknown comment", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn delete_comment_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageComments)?;
    CommentService::new(&state.db).delete_comment(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Creates and returns the comment API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/comments",
            get(list_comments_handler).post(create_comment_handler),
        )
        .route(
            "/comments/{id}",
            get(get_comment_handler)
                .put(update_comment_handler)
                .patch(update_comment_handler)
                .delete(delete_comment_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_task_is_a_validation_error() {
        let err = ApiError::from(CommentServiceError::TaskNotInProject {
            task_id: 4,
            project_id: 2,
        });
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Task 4 does not belong to project 2");
    }
}
