//! Attachment metadata.
//!
//! Only the file name and the path it is served from are stored. Moving the
//! bytes is left to whatever fronts `/uploads`.

use crate::entities::*;
use crate::web::api::v1::{nullable_id, optional_id};
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

pub mod api;

/// Fields accepted when recording an attachment.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAttachment {
    pub file_name: Option<String>,
    /// Defaults to `/uploads/{fileName}`.
    pub file_path: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub project_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub task_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub comment_id: Option<i32>,
    /// Defaults to the caller.
    #[serde(default, deserialize_with = "optional_id")]
    pub uploaded_by_id: Option<i32>,
}

/// Fields accepted when updating an attachment. A `null` id detaches it.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentChanges {
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    #[serde(default, deserialize_with = "nullable_id")]
    #[schema(value_type = Option<i32>)]
    pub project_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable_id")]
    #[schema(value_type = Option<i32>)]
    pub task_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable_id")]
    #[schema(value_type = Option<i32>)]
    pub comment_id: Option<Option<i32>>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentFilter {
    pub project_id: Option<i32>,
    pub task_id: Option<i32>,
    pub comment_id: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Attachment with ID {0} not found")]
    AttachmentNotFound(i32),
    #[error("Project with ID {0} not found")]
    ProjectNotFound(i32),
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    #[error("Comment with ID {0} not found")]
    CommentNotFound(i32),
    #[error("User with ID {0} not found")]
    UserNotFound(i32),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct AttachmentService<'a> {
    db: &'a DatabaseConnection,
}

impl AttachmentService<'_> {
    pub fn new(db: &DatabaseConnection) -> AttachmentService<'_> {
        AttachmentService { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_attachment(
        &self,
        caller_id: i32,
        new_attachment: NewAttachment,
    ) -> Result<attachment::Model, AttachmentServiceError> {
        let file_name = new_attachment
            .file_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(AttachmentServiceError::MissingField("fileName"))?;
        let file_path = new_attachment
            .file_path
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| default_file_path(&file_name));
        let uploaded_by_id = new_attachment.uploaded_by_id.unwrap_or(caller_id);

        self.ensure_targets(
            new_attachment.project_id,
            new_attachment.task_id,
            new_attachment.comment_id,
        )
        .await?;
        user::Entity::find_by_id(uploaded_by_id)
            .one(self.db)
            .await?
            .ok_or(AttachmentServiceError::UserNotFound(uploaded_by_id))?;

        let active_model = attachment::ActiveModel {
            file_name: ActiveValue::Set(file_name),
            file_path: ActiveValue::Set(file_path),
            uploaded_by_id: ActiveValue::Set(Some(uploaded_by_id)),
            project_id: ActiveValue::Set(new_attachment.project_id),
            task_id: ActiveValue::Set(new_attachment.task_id),
            comment_id: ActiveValue::Set(new_attachment.comment_id),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    /// Lists attachments newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_attachments(
        &self,
        filter: AttachmentFilter,
    ) -> Result<Vec<attachment::Model>, AttachmentServiceError> {
        let mut query = attachment::Entity::find()
            .order_by_desc(attachment::Column::UploadedAt)
            .order_by_desc(attachment::Column::Id);
        if let Some(project_id) = filter.project_id {
            query = query.filter(attachment::Column::ProjectId.eq(project_id));
        }
        if let Some(task_id) = filter.task_id {
            query = query.filter(attachment::Column::TaskId.eq(task_id));
        }
        if let Some(comment_id) = filter.comment_id {
            query = query.filter(attachment::Column::CommentId.eq(comment_id));
        }
        Ok(query.all(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_attachment(
        &self,
        id: i32,
    ) -> Result<attachment::Model, AttachmentServiceError> {
        attachment::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(AttachmentServiceError::AttachmentNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_attachment(
        &self,
        id: i32,
        changes: AttachmentChanges,
    ) -> Result<attachment::Model, AttachmentServiceError> {
        let mut active_model: attachment::ActiveModel = self.get_attachment(id).await?.into();

        self.ensure_targets(
            changes.project_id.flatten(),
            changes.task_id.flatten(),
            changes.comment_id.flatten(),
        )
        .await?;

        if let Some(file_name) = changes.file_name {
            let file_name = file_name.trim().to_string();
            if file_name.is_empty() {
                return Err(AttachmentServiceError::MissingField("fileName"));
            }
            active_model.file_name = ActiveValue::Set(file_name);
        }
        if let Some(file_path) = changes.file_path {
            if file_path.trim().is_empty() {
                return Err(AttachmentServiceError::MissingField("filePath"));
            }
            active_model.file_path = ActiveValue::Set(file_path);
        }
        if let Some(project_id) = changes.project_id {
            active_model.project_id = ActiveValue::Set(project_id);
        }
        if let Some(task_id) = changes.task_id {
            active_model.task_id = ActiveValue::Set(task_id);
        }
        if let Some(comment_id) = changes.comment_id {
            active_model.comment_id = ActiveValue::Set(comment_id);
        }

        Ok(active_model.update(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_attachment(&self, id: i32) -> Result<(), AttachmentServiceError> {
        let result = attachment::Entity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(AttachmentServiceError::AttachmentNotFound(id));
        }
        Ok(())
    }

    async fn ensure_targets(
        &self,
        project_id: Option<i32>,
        task_id: Option<i32>,
        comment_id: Option<i32>,
    ) -> Result<(), AttachmentServiceError> {
        if let Some(project_id) = project_id {
            project::Entity::find_by_id(project_id)
                .one(self.db)
                .await?
                .ok_or(AttachmentServiceError::ProjectNotFound(project_id))?;
        }
        if let Some(task_id) = task_id {
            task::Entity::find_by_id(task_id)
                .one(self.db)
                .await?
                .ok_or(AttachmentServiceError::TaskNotFound(task_id))?;
        }
        if let Some(comment_id) = comment_id {
            comment::Entity::find_by_id(comment_id)
                .one(self.db)
                .await?
                .ok_or(AttachmentServiceError::CommentNotFound(comment_id))?;
        }
        Ok(())
    }
}

fn default_file_path(file_name: &str) -> String {
    format!("/uploads/{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_land_under_uploads_by_default() {
        assert_eq!(default_file_path("plan.pdf"), "/uploads/plan.pdf");
    }

    #[test]
    fn null_detaches_while_absent_keeps() {
        let changes: AttachmentChanges =
            serde_json::from_str(r#"{"taskId": null, "commentId": "7"}"#).unwrap();

        assert_eq!(changes.task_id, Some(None));
        assert_eq!(changes.comment_id, Some(Some(7)));
        assert_eq!(changes.project_id, None);
    }
}
