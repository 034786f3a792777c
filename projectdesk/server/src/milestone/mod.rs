use crate::entities::*;
use chrono::NaiveDate;
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

pub mod api;

/// Fields accepted when creating a milestone.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewMilestone {
    pub project_id: Option<i32>,
    pub name: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Fields accepted when updating a milestone.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneChanges {
    pub name: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum MilestoneServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Milestone with ID {0} not found")]
    MilestoneNotFound(i32),
    #[error("Project with ID {0} not found")]
    ProjectNotFound(i32),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct MilestoneService<'a> {
    db: &'a DatabaseConnection,
}

impl MilestoneService<'_> {
    pub fn new(db: &DatabaseConnection) -> MilestoneService<'_> {
        MilestoneService { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_milestone(
        &self,
        new_milestone: NewMilestone,
    ) -> Result<milestone::Model, MilestoneServiceError> {
        let project_id = new_milestone
            .project_id
            .ok_or(MilestoneServiceError::MissingField("projectId"))?;
        let name = new_milestone
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(MilestoneServiceError::MissingField("name"))?;
        let due_date = new_milestone
            .due_date
            .ok_or(MilestoneServiceError::MissingField("dueDate"))?;

        project::Entity::find_by_id(project_id)
            .one(self.db)
            .await?
            .ok_or(MilestoneServiceError::ProjectNotFound(project_id))?;

        let active_model = milestone::ActiveModel {
            project_id: ActiveValue::Set(project_id),
            name: ActiveValue::Set(name),
            due_date: ActiveValue::Set(due_date),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    /// Lists milestones by due date, optionally restricted to one project.
    #[tracing::instrument(skip(self))]
    pub async fn list_milestones(
        &self,
        project_id: Option<i32>,
    ) -> Result<Vec<milestone::Model>, MilestoneServiceError> {
        let mut query = milestone::Entity::find()
            .order_by_asc(milestone::Column::DueDate)
            .order_by_asc(milestone::Column::Id);
        if let Some(project_id) = project_id {
            query = query.filter(milestone::Column::ProjectId.eq(project_id));
        }
        Ok(query.all(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_milestone(&self, id: i32) -> Result<milestone::Model, MilestoneServiceError> {
        milestone::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(MilestoneServiceError::MilestoneNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_milestone(
        &self,
        id: i32,
        changes: MilestoneChanges,
    ) -> Result<milestone::Model, MilestoneServiceError> {
        let mut active_model: milestone::ActiveModel = self.get_milestone(id).await?.into();
        if let Some(name) = changes.name {
            if name.trim().is_empty() {
                return Err(MilestoneServiceError::MissingField("name"));
            }
            active_model.name = ActiveValue::Set(name);
        }
        if let Some(due_date) = changes.due_date {
            active_model.due_date = ActiveValue::Set(due_date);
        }
        Ok(active_model.update(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_milestone(&self, id: i32) -> Result<(), MilestoneServiceError> {
        let result = milestone::Entity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(MilestoneServiceError::MilestoneNotFound(id));
        }
        Ok(())
    }
}
