use crate::dependency;
use crate::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use crate::entities::*;
use crate::web::api::v1::nullable;
use chrono::NaiveDate;
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

pub mod api;

/// What deleting a task does to the dependency edges touching it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnTaskDelete {
    /// Delete the edges together with the task.
    #[default]
    Cascade,
    /// Refuse to delete a task that still takes part in an edge.
    Block,
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub project_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<i32>,
    pub estimated_hours: Option<f64>,
    pub spent_hours: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub deliverable_name: Option<String>,
}

/// Fields accepted when updating a task. Absent fields are left unchanged;
/// an explicit `null` clears the nullable ones.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub assignee_id: Option<Option<i32>>,
    pub estimated_hours: Option<f64>,
    pub spent_hours: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub deliverable_name: Option<Option<String>>,
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    #[error("Project with ID {0} not found")]
    ProjectNotFound(i32),
    #[error("Assignee with ID {0} not found")]
    AssigneeNotFound(i32),
    #[error("Task {task_id} still takes part in {edges} dependencies")]
    HasDependencies { task_id: i32, edges: u64 },
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct TaskService<'a> {
    db: &'a DatabaseConnection,
}

impl TaskService<'_> {
    pub fn new(db: &DatabaseConnection) -> TaskService<'_> {
        TaskService { db }
    }

    /// Creates a task. Status and priority default to TO_DO and MEDIUM.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, new_task: NewTask) -> Result<task::Model, TaskServiceError> {
        let project_id = new_task
            .project_id
            .ok_or(TaskServiceError::MissingField("projectId"))?;
        let title = new_task
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or(TaskServiceError::MissingField("title"))?;

        project::Entity::find_by_id(project_id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::ProjectNotFound(project_id))?;
        if let Some(assignee_id) = new_task.assignee_id {
            self.ensure_assignee(assignee_id).await?;
        }

        let active_model = task::ActiveModel {
            project_id: ActiveValue::Set(project_id),
            title: ActiveValue::Set(title),
            description: ActiveValue::Set(new_task.description),
            status: ActiveValue::Set(new_task.status.unwrap_or(TaskStatus::ToDo)),
            priority: ActiveValue::Set(new_task.priority.unwrap_or(TaskPriority::Medium)),
            assignee_id: ActiveValue::Set(new_task.assignee_id),
            estimated_hours: ActiveValue::Set(new_task.estimated_hours.unwrap_or(0.0)),
            spent_hours: ActiveValue::Set(new_task.spent_hours.unwrap_or(0.0)),
            start_date: ActiveValue::Set(new_task.start_date),
            due_date: ActiveValue::Set(new_task.due_date),
            deliverable_name: ActiveValue::Set(new_task.deliverable_name),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    /// Lists tasks, optionally restricted to one project, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(
        &self,
        project_id: Option<i32>,
    ) -> Result<Vec<task::Model>, TaskServiceError> {
        let mut query = task::Entity::find().order_by_asc(task::Column::Id);
        if let Some(project_id) = project_id {
            query = query.filter(task::Column::ProjectId.eq(project_id));
        }
        Ok(query.all(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, id: i32) -> Result<task::Model, TaskServiceError> {
        task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        id: i32,
        changes: TaskChanges,
    ) -> Result<task::Model, TaskServiceError> {
        let mut active_model: task::ActiveModel = self.get_task(id).await?.into();

        if let Some(title) = changes.title {
            if title.trim().is_empty() {
                return Err(TaskServiceError::MissingField("title"));
            }
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = changes.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(status) = changes.status {
            active_model.status = ActiveValue::Set(status);
        }
        if let Some(priority) = changes.priority {
            active_model.priority = ActiveValue::Set(priority);
        }
        if let Some(assignee_id) = changes.assignee_id {
            if let Some(id) = assignee_id {
                self.ensure_assignee(id).await?;
            }
            active_model.assignee_id = ActiveValue::Set(assignee_id);
        }
        if let Some(hours) = changes.estimated_hours {
            active_model.estimated_hours = ActiveValue::Set(hours);
        }
        if let Some(hours) = changes.spent_hours {
            active_model.spent_hours = ActiveValue::Set(hours);
        }
        if let Some(date) = changes.start_date {
            active_model.start_date = ActiveValue::Set(date);
        }
        if let Some(date) = changes.due_date {
            active_model.due_date = ActiveValue::Set(date);
        }
        if let Some(name) = changes.deliverable_name {
            active_model.deliverable_name = ActiveValue::Set(name);
        }

        Ok(active_model.update(self.db).await?)
    }

    /// Deletes a task, handling its dependency edges according to `policy`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(
        &self,
        id: i32,
        policy: OnTaskDelete,
    ) -> Result<task::Model, TaskServiceError> {
        let txn = self.db.begin().await?;

        let task = task::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        // Same lock as dependency insertion, so no edge can appear between
        // the check below and the delete.
        project::Entity::find_by_id(task.project_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TaskServiceError::ProjectNotFound(task.project_id))?;

        match policy {
            OnTaskDelete::Cascade => {
                let removed = dependency::delete_edges_of_task(&txn, id).await?;
                if removed > 0 {
                    tracing::info!("Removed {} dependencies of task {}", removed, id);
                }
            }
            OnTaskDelete::Block => {
                let edges = dependency::count_edges_of_task(&txn, id).await?;
                if edges > 0 {
                    return Err(TaskServiceError::HasDependencies { task_id: id, edges });
                }
            }
        }

        task::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(task)
    }

    async fn ensure_assignee(&self, assignee_id: i32) -> Result<(), TaskServiceError> {
        user::Entity::find_by_id(assignee_id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::AssigneeNotFound(assignee_id))?;
        Ok(())
    }
}
