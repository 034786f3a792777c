use crate::entities::*;
use crate::web::api::v1::optional_id;
use sea_orm::*;
use serde::Deserialize;
use std::collections::HashMap;
use utoipa::ToSchema;

pub mod api;

/// Fields accepted when posting a comment. The author is always the caller.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub project_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub task_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentChanges {
    pub content: Option<String>,
}

/// A comment with the attachment metadata filed under it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentDetails {
    pub comment: comment::Model,
    pub attachments: Vec<attachment::Model>,
}

#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Comment with ID {0} not found")]
    CommentNotFound(i32),
    #[error("Project with ID {0} not found")]
    ProjectNotFound(i32),
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    #[error("Task {task_id} does not belong to project {project_id}")]
    TaskNotInProject { task_id: i32, project_id: i32 },
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct CommentService<'a> {
    db: &'a DatabaseConnection,
}

impl CommentService<'_> {
    pub fn new(db: &DatabaseConnection) -> CommentService<'_> {
        CommentService { db }
    }

    /// Posts a comment. A comment on a task is also filed under the task's
    /// project.
    #[tracing::instrument(skip(self))]
    pub async fn create_comment(
        &self,
        caller_id: i32,
        new_comment: NewComment,
    ) -> Result<CommentDetails, CommentServiceError> {
        let content = new_comment
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or(CommentServiceError::MissingField("content"))?;
        let project_id =
            resolve_target(self.db, new_comment.project_id, new_comment.task_id).await?;

        let active_model = comment::ActiveModel {
            content: ActiveValue::Set(content),
            user_id: ActiveValue::Set(caller_id),
            project_id: ActiveValue::Set(project_id),
            task_id: ActiveValue::Set(new_comment.task_id),
            ..Default::default()
        };
        let comment = active_model.insert(self.db).await?;
        Ok(CommentDetails {
            comment,
            attachments: Vec::new(),
        })
    }

    /// Lists comments newest first, filtered by project and/or task.
    #[tracing::instrument(skip(self))]
    pub async fn list_comments(
        &self,
        project_id: Option<i32>,
        task_id: Option<i32>,
    ) -> Result<Vec<CommentDetails>, CommentServiceError> {
        let mut query = comment::Entity::find()
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id);
        if let Some(project_id) = project_id {
            query = query.filter(comment::Column::ProjectId.eq(project_id));
        }
        if let Some(task_id) = task_id {
            query = query.filter(comment::Column::TaskId.eq(task_id));
        }
        let comments = query.all(self.db).await?;

        let ids: Vec<i32> = comments.iter().map(|comment| comment.id).collect();
        let mut by_comment: HashMap<i32, Vec<attachment::Model>> = HashMap::new();
        if !ids.is_empty() {
            for attachment in attachment::Entity::find()
                .filter(attachment::Column::CommentId.is_in(ids))
                .order_by_asc(attachment::Column::Id)
                .all(self.db)
                .await?
            {
                if let Some(comment_id) = attachment.comment_id {
                    by_comment.entry(comment_id).or_default().push(attachment);
                }
            }
        }

        Ok(comments
            .into_iter()
            .map(|comment| CommentDetails {
                attachments: by_comment.remove(&comment.id).unwrap_or_default(),
                comment,
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_comment(&self, id: i32) -> Result<CommentDetails, CommentServiceError> {
        let comment = comment::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(CommentServiceError::CommentNotFound(id))?;
        let attachments = comment
            .find_related(attachment::Entity)
            .order_by_asc(attachment::Column::Id)
            .all(self.db)
            .await?;
        Ok(CommentDetails {
            comment,
            attachments,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_comment(
        &self,
        id: i32,
        changes: CommentChanges,
    ) -> Result<CommentDetails, CommentServiceError> {
        let details = self.get_comment(id).await?;
        let Some(content) = changes.content else {
            return Ok(details);
        };
        if content.trim().is_empty() {
            return Err(CommentServiceError::MissingField("content"));
        }

        let mut active_model: comment::ActiveModel = details.comment.into();
        active_model.content = ActiveValue::Set(content);
        Ok(CommentDetails {
            comment: active_model.update(self.db).await?,
            attachments: details.attachments,
        })
    }

    /// Deletes a comment. Its attachments go with it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_comment(&self, id: i32) -> Result<(), CommentServiceError> {
        let result = comment::Entity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(CommentServiceError::CommentNotFound(id));
        }
        Ok(())
    }
}

/// Checks that the referenced project and task exist and agree with each
/// other. Returns the project the comment is filed under.
async fn resolve_target(
    db: &DatabaseConnection,
    project_id: Option<i32>,
    task_id: Option<i32>,
) -> Result<Option<i32>, CommentServiceError> {
    if let Some(project_id) = project_id {
        project::Entity::find_by_id(project_id)
            .one(db)
            .await?
            .ok_or(CommentServiceError::ProjectNotFound(project_id))?;
    }
    let Some(task_id) = task_id else {
        return Ok(project_id);
    };

    let task = task::Entity::find_by_id(task_id)
        .one(db)
        .await?
        .ok_or(CommentServiceError::TaskNotFound(task_id))?;
    match project_id {
        Some(project_id) if project_id != task.project_id => {
            Err(CommentServiceError::TaskNotInProject {
                task_id,
                project_id,
            })
        }
        _ => Ok(Some(task.project_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_comment_with_string_ids() {
        let new_comment: NewComment =
            serde_json::from_str(r#"{"content": "Looks good", "projectId": "", "taskId": "12"}"#)
                .unwrap();

        assert_eq!(new_comment.content.as_deref(), Some("Looks good"));
        assert_eq!(new_comment.project_id, None);
        assert_eq!(new_comment.task_id, Some(12));
    }
}
