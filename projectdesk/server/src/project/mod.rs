use crate::entities::*;
use chrono::NaiveDate;
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

pub mod api;

/// Fields accepted when creating a project.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub budgeted_cost: Option<f64>,
}

/// Fields accepted when updating a project. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub budgeted_cost: Option<f64>,
}

/// A project together with its tasks and milestones.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDetails {
    pub project: project::Model,
    pub tasks: Vec<task::Model>,
    pub milestones: Vec<milestone::Model>,
}

/// Error type for ProjectService operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    #[error("Project name is required")]
    MissingName,
    #[error("Project with ID {0} not found")]
    ProjectNotFound(i32),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct ProjectService<'a> {
    db: &'a DatabaseConnection,
}

impl ProjectService<'_> {
    pub fn new(db: &DatabaseConnection) -> ProjectService<'_> {
        ProjectService { db }
    }

    /// Creates a project owned by `owner_id`.
    #[tracing::instrument(skip(self))]
    pub async fn create_project(
        &self,
        owner_id: i32,
        new_project: NewProject,
    ) -> Result<project::Model, ProjectServiceError> {
        let name = new_project
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(ProjectServiceError::MissingName)?;

        let active_model = project::ActiveModel {
            name: ActiveValue::Set(name),
            description: ActiveValue::Set(new_project.description),
            owner_id: ActiveValue::Set(owner_id),
            start_date: ActiveValue::Set(new_project.start_date),
            due_date: ActiveValue::Set(new_project.due_date),
            budgeted_cost: ActiveValue::Set(new_project.budgeted_cost.unwrap_or(0.0)),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<project::Model>, ProjectServiceError> {
        Ok(project::Entity::find()
            .order_by_asc(project::Column::Id)
            .all(self.db)
            .await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_project(&self, id: i32) -> Result<project::Model, ProjectServiceError> {
        project::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(ProjectServiceError::ProjectNotFound(id))
    }

    /// Retrieves a project with its tasks and milestones eagerly loaded.
    #[tracing::instrument(skip(self))]
    pub async fn get_project_details(
        &self,
        id: i32,
    ) -> Result<ProjectDetails, ProjectServiceError> {
        let project = self.get_project(id).await?;
        let tasks = project
            .find_related(task::Entity)
            .order_by_asc(task::Column::Id)
            .all(self.db)
            .await?;
        let milestones = project
            .find_related(milestone::Entity)
            .order_by_asc(milestone::Column::DueDate)
            .all(self.db)
            .await?;
        Ok(ProjectDetails {
            project,
            tasks,
            milestones,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_project(
        &self,
        id: i32,
        changes: ProjectChanges,
    ) -> Result<project::Model, ProjectServiceError> {
        let mut active_model: project::ActiveModel = self.get_project(id).await?.into();

        if let Some(name) = changes.name {
            if name.trim().is_empty() {
                return Err(ProjectServiceError::MissingName);
            }
            active_model.name = ActiveValue::Set(name);
        }
        if let Some(description) = changes.description {
            active_model.description = ActiveValue::Set(Some(description));
        }
        if let Some(date) = changes.start_date {
            active_model.start_date = ActiveValue::Set(Some(date));
        }
        if let Some(date) = changes.due_date {
            active_model.due_date = ActiveValue::Set(Some(date));
        }
        if let Some(cost) = changes.budgeted_cost {
            active_model.budgeted_cost = ActiveValue::Set(cost);
        }

        Ok(active_model.update(self.db).await?)
    }

    /// Deletes a project. Its tasks, their dependencies and its milestones go with it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_project(&self, id: i32) -> Result<project::Model, ProjectServiceError> {
        let project = self.get_project(id).await?;
        project::Entity::delete_by_id(id)
            .exec(self.db)
            .await?;
        Ok(project)
    }
}
