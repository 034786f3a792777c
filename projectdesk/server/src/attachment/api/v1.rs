use crate::attachment::{
    AttachmentChanges, AttachmentFilter, AttachmentService, AttachmentServiceError, NewAttachment,
};
use crate::auth::RequestContext;
use crate::entities::attachment;
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
pub struct AttachmentJson {
    pub id: i32,
    pub file_name: String,
    pub file_path: String,
    pub uploaded_by_id: Option<i32>,
    pub project_id: Option<i32>,
    pub task_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub uploaded_at: DateTime<FixedOffset>,
}

impl From<attachment::Model> for AttachmentJson {
    fn from(model: attachment::Model) -> Self {
        Self {
            id: model.id,
            file_name: model.file_name,
            file_path: model.file_path,
            uploaded_by_id: model.uploaded_by_id,
            project_id: model.project_id,
            task_id: model.task_id,
            comment_id: model.comment_id,
            uploaded_at: model.uploaded_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentsQuery {
    #[serde(default)]
    pub project_id: Option<i32>,
    #[serde(default)]
    pub task_id: Option<i32>,
    #[serde(default)]
    pub comment_id: Option<i32>,
}

impl From<AttachmentsQuery> for AttachmentFilter {
    fn from(query: AttachmentsQuery) -> Self {
        Self {
            project_id: query.project_id,
            task_id: query.task_id,
            comment_id: query.comment_id,
        }
    }
}

impl From<AttachmentServiceError> for ApiError {
    fn from(err: AttachmentServiceError) -> Self {
        match err {
            AttachmentServiceError::MissingField(_) => ApiError::Validation(err.to_string()),
            AttachmentServiceError::AttachmentNotFound(_)
            | AttachmentServiceError::ProjectNotFound(_)
            | AttachmentServiceError::TaskNotFound(_)
            | AttachmentServiceError::CommentNotFound(_)
            | AttachmentServiceError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            AttachmentServiceError::Database(_) => ApiError::internal(err),
        }
    }
}

/// Handler for GET /api/v1/attachments
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/attachments",
    params(
        ("projectId" = Option<i32>, Query, description = "Optional project to filter by"),
        ("taskId" = Option<i32>, Query, description = "Optional task to filter by"),
        ("commentId" = Option<i32>, Query, description = "Optional comment to filter by")
    ),
    responses(
        (status = 200, description = "Attachments, newest first", body = [AttachmentJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Attachments"
)]
pub async fn list_attachments_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<AttachmentsQuery>,
) -> Result<Json<Vec<AttachmentJson>>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let attachments = AttachmentService::new(&state.db)
        .list_attachments(query.into())
        .await?;
    Ok(Json(
        attachments.into_iter().map(AttachmentJson::from).collect(),
    ))
}

/// Handler for POST /api/v1/attachments
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/attachments",
    request_body = NewAttachment,
    responses(
        (status = 200, description = "Recorded attachment", body = AttachmentJson),
        (status = 400, description = "Missing file name", body = ErrorResponse),
        (status = 404, description = "Unknown project, task, comment or uploader", body = ErrorResponse)
    ),
    tag = "Attachments"
)]
pub async fn create_attachment_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(new_attachment), _): WithRejection<Json<NewAttachment>, ApiError>,
) -> Result<Json<AttachmentJson>, ApiError> {
    ctx.require(Capability::ManageComments)?;
    let attachment = AttachmentService::new(&state.db)
        .create_attachment(ctx.user_id, new_attachment)
        .await?;
    Ok(Json(AttachmentJson::from(attachment)))
}

/// Handler for GET /api/v1/attachments/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/attachments/{id}",
    params(("id" = i32, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "The attachment", body = AttachmentJson),
        (status = 404, description = "Unknown attachment", body = ErrorResponse)
    ),
    tag = "Attachments"
)]
pub async fn get_attachment_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<AttachmentJson>, ApiError> {
    ctx.require(Capability::ViewProjects)?;
    let attachment = AttachmentService::new(&state.db).get_attachment(id).await?;
    Ok(Json(AttachmentJson::from(attachment)))
}

/// Handler for PUT /api/v1/attachments/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/attachments/{id}",
    params(("id" = i32, Path, description = "Attachment id")),
    request_body = AttachmentChanges,
    responses(
        (status = 200, description = "Updated attachment", body = AttachmentJson),
        (status = 400, description = "Blank file name or path", body = ErrorResponse),
        (status = 404, description = "Unknown attachment or target", body = ErrorResponse)
    ),
    tag = "Attachments"
)]
pub async fn update_attachment_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    WithRejection(Json(changes), _): WithRejection<Json<AttachmentChanges>, ApiError>,
) -> Result<Json<AttachmentJson>, ApiError> {
    ctx.require(Capability::ManageComments)?;
    let attachment = AttachmentService::new(&state.db)
        .update_attachment(id, changes)
        .await?;
    Ok(Json(AttachmentJson::from(attachment)))
}

/// Handler for DELETE /api/v1/attachments/{id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/attachments/{id}",
    params(("id" = i32, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment deleted", body = SuccessResponse),
        (status = 404, description = "Unknown attachment", body = ErrorResponse)
    ),
    tag = "Attachments"
)]
pub async fn delete_attachment_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    ctx.require(Capability::ManageComments)?;
    AttachmentService::new(&state.db)
        .delete_attachment(id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Creates and returns the attachment API router.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/attachments",
            get(list_attachments_handler).post(create_attachment_handler),
        )
        .route(
            "/attachments/{id}",
            get(get_attachment_handler)
                .put(update_attachment_handler)
                .patch(update_attachment_handler)
                .delete(delete_attachment_handler),
        )
        .with_state(state)
}
