use crate::entities::*;
use crate::web::api::v1::optional_id;
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

pub mod api;

/// Share of a person's time given to a project when the request names none.
pub const DEFAULT_ALLOCATION_PERCENT: i32 = 100;

/// Fields accepted when allocating a user to a project.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    #[serde(default, deserialize_with = "optional_id")]
    pub project_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<i32>,
    pub allocation_percent: Option<i32>,
}

/// Fields accepted when updating an allocation. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceChanges {
    #[serde(default, deserialize_with = "optional_id")]
    pub project_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<i32>,
    pub allocation_percent: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("allocationPercent must be between 1 and 100, got {0}")]
    InvalidAllocation(i32),
    #[error("Resource with ID {0} not found")]
    ResourceNotFound(i32),
    #[error("Project with ID {0} not found")]
    ProjectNotFound(i32),
    #[error("User with ID {0} not found")]
    UserNotFound(i32),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct ResourceService<'a> {
    db: &'a DatabaseConnection,
}

impl ResourceService<'_> {
    pub fn new(db: &DatabaseConnection) -> ResourceService<'_> {
        ResourceService { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_resource(
        &self,
        new_resource: NewResource,
    ) -> Result<resource::Model, ResourceServiceError> {
        let project_id = new_resource
            .project_id
            .ok_or(ResourceServiceError::MissingField("projectId"))?;
        let user_id = new_resource
            .user_id
            .ok_or(ResourceServiceError::MissingField("userId"))?;
        let allocation = check_allocation(
            new_resource
                .allocation_percent
                .unwrap_or(DEFAULT_ALLOCATION_PERCENT),
        )?;

        self.ensure_project(project_id).await?;
        self.ensure_user(user_id).await?;

        let active_model = resource::ActiveModel {
            project_id: ActiveValue::Set(project_id),
            user_id: ActiveValue::Set(user_id),
            allocation_percent: ActiveValue::Set(allocation),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    /// Lists allocations, newest first, optionally restricted to one project.
    #[tracing::instrument(skip(self))]
    pub async fn list_resources(
        &self,
        project_id: Option<i32>,
    ) -> Result<Vec<resource::Model>, ResourceServiceError> {
        let mut query = resource::Entity::find()
            .order_by_desc(resource::Column::CreatedAt)
            .order_by_desc(resource::Column::Id);
        if let Some(project_id) = project_id {
            query = query.filter(resource::Column::ProjectId.eq(project_id));
        }
        Ok(query.all(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_resource(&self, id: i32) -> Result<resource::Model, ResourceServiceError> {
        resource::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(ResourceServiceError::ResourceNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_resource(
        &self,
        id: i32,
        changes: ResourceChanges,
    ) -> Result<resource::Model, ResourceServiceError> {
        let mut active_model: resource::ActiveModel = self.get_resource(id).await?.into();

        if let Some(project_id) = changes.project_id {
            self.ensure_project(project_id).await?;
            active_model.project_id = ActiveValue::Set(project_id);
        }
        if let Some(user_id) = changes.user_id {
            self.ensure_user(user_id).await?;
            active_model.user_id = ActiveValue::Set(user_id);
        }
        if let Some(allocation) = changes.allocation_percent {
            active_model.allocation_percent = ActiveValue::Set(check_allocation(allocation)?);
        }

        Ok(active_model.update(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_resource(&self, id: i32) -> Result<(), ResourceServiceError> {
        let result = resource::Entity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(ResourceServiceError::ResourceNotFound(id));
        }
        Ok(())
    }

    async fn ensure_project(&self, project_id: i32) -> Result<(), ResourceServiceError> {
        project::Entity::find_by_id(project_id)
            .one(self.db)
            .await?
            .ok_or(ResourceServiceError::ProjectNotFound(project_id))?;
        Ok(())
    }

    async fn ensure_user(&self, user_id: i32) -> Result<(), ResourceServiceError> {
        user::Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or(ResourceServiceError::UserNotFound(user_id))?;
        Ok(())
    }
}

fn check_allocation(percent: i32) -> Result<i32, ResourceServiceError> {
    if (1..=100).contains(&percent) {
        Ok(percent)
    } else {
        Err(ResourceServiceError::InvalidAllocation(percent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_must_be_a_percentage() {
        assert_eq!(check_allocation(1).unwrap(), 1);
        assert_eq!(check_allocation(100).unwrap(), 100);
        assert!(matches!(
            check_allocation(0),
            Err(ResourceServiceError::InvalidAllocation(0))
        ));
        assert!(matches!(
            check_allocation(150),
            Err(ResourceServiceError::InvalidAllocation(150))
        ));
    }
}
