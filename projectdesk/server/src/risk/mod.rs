use crate::entities::sea_orm_active_enums::{RiskSeverity, RiskStatus};
use crate::entities::*;
use crate::web::api::v1::{nullable, optional_id};
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

pub mod api;

/// Fields accepted when reporting a risk.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewRisk {
    #[serde(default, deserialize_with = "optional_id")]
    pub project_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<RiskSeverity>,
    pub mitigation_plan: Option<String>,
    /// Defaults to the caller.
    #[serde(default, deserialize_with = "optional_id")]
    pub reported_by_id: Option<i32>,
}

/// Fields accepted when updating a risk. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskChanges {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub severity: Option<RiskSeverity>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub mitigation_plan: Option<Option<String>>,
    pub status: Option<RiskStatus>,
}

#[derive(Debug, thiserror::Error)]
pub enum RiskServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Risk with ID {0} not found")]
    RiskNotFound(i32),
    #[error("Project with ID {0} not found")]
    ProjectNotFound(i32),
    #[error("User with ID {0} not found")]
    UserNotFound(i32),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct RiskService<'a> {
    db: &'a DatabaseConnection,
}

impl RiskService<'_> {
    pub fn new(db: &DatabaseConnection) -> RiskService<'_> {
        RiskService { db }
    }

    /// Records a risk against a project. New risks start out OPEN.
    #[tracing::instrument(skip(self))]
    pub async fn create_risk(
        &self,
        caller_id: i32,
        new_risk: NewRisk,
    ) -> Result<risk::Model, RiskServiceError> {
        let project_id = new_risk
            .project_id
            .ok_or(RiskServiceError::MissingField("projectId"))?;
        let title = new_risk
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or(RiskServiceError::MissingField("title"))?;
        let severity = new_risk
            .severity
            .ok_or(RiskServiceError::MissingField("severity"))?;
        let reported_by_id = new_risk.reported_by_id.unwrap_or(caller_id);

        project::Entity::find_by_id(project_id)
            .one(self.db)
            .await?
            .ok_or(RiskServiceError::ProjectNotFound(project_id))?;
        user::Entity::find_by_id(reported_by_id)
            .one(self.db)
            .await?
            .ok_or(RiskServiceError::UserNotFound(reported_by_id))?;

        let active_model = risk::ActiveModel {
            project_id: ActiveValue::Set(project_id),
            title: ActiveValue::Set(title),
            description: ActiveValue::Set(new_risk.description),
            severity: ActiveValue::Set(severity),
            mitigation_plan: ActiveValue::Set(new_risk.mitigation_plan),
            status: ActiveValue::Set(RiskStatus::Open),
            reported_by_id: ActiveValue::Set(reported_by_id),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    /// Lists risks, optionally restricted to one project, most severe first.
    #[tracing::instrument(skip(self))]
    pub async fn list_risks(
        &self,
        project_id: Option<i32>,
    ) -> Result<Vec<risk::Model>, RiskServiceError> {
        let mut query = risk::Entity::find().order_by_asc(risk::Column::Id);
        if let Some(project_id) = project_id {
            query = query.filter(risk::Column::ProjectId.eq(project_id));
        }
        let mut risks = query.all(self.db).await?;
        // Stable, so ties keep id order.
        risks.sort_by_key(|risk| std::cmp::Reverse(severity_rank(risk.severity)));
        Ok(risks)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_risk(&self, id: i32) -> Result<risk::Model, RiskServiceError> {
        risk::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(RiskServiceError::RiskNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_risk(
        &self,
        id: i32,
        changes: RiskChanges,
    ) -> Result<risk::Model, RiskServiceError> {
        let mut active_model: risk::ActiveModel = self.get_risk(id).await?.into();

        if let Some(title) = changes.title {
            if title.trim().is_empty() {
                return Err(RiskServiceError::MissingField("title"));
            }
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = changes.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(severity) = changes.severity {
            active_model.severity = ActiveValue::Set(severity);
        }
        if let Some(plan) = changes.mitigation_plan {
            active_model.mitigation_plan = ActiveValue::Set(plan);
        }
        if let Some(status) = changes.status {
            active_model.status = ActiveValue::Set(status);
        }

        Ok(active_model.update(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_risk(&self, id: i32) -> Result<(), RiskServiceError> {
        let result = risk::Entity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(RiskServiceError::RiskNotFound(id));
        }
        Ok(())
    }
}

fn severity_rank(severity: RiskSeverity) -> u8 {
    match severity {
        RiskSeverity::Low => 0,
        RiskSeverity::Medium => 1,
        RiskSeverity::High => 2,
        RiskSeverity::Critical => 3,
    }
}
