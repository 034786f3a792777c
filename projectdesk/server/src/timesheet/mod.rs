use crate::entities::*;
use crate::web::api::v1::{nullable, optional_date, optional_id};
use chrono::NaiveDate;
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

pub mod api;

/// Fields accepted when logging time.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTimesheet {
    #[serde(default, deserialize_with = "optional_id")]
    pub task_id: Option<i32>,
    /// Defaults to the caller.
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<i32>,
    pub minutes: Option<i32>,
    pub description: Option<String>,
    /// Defaults to billable.
    pub is_billable: Option<bool>,
    /// Defaults to today (UTC).
    #[serde(default, deserialize_with = "optional_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

/// Fields accepted when correcting a timesheet entry.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetChanges {
    pub minutes: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_billable: Option<bool>,
    #[serde(default, deserialize_with = "optional_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum TimesheetServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("minutes must be positive, got {0}")]
    InvalidMinutes(i32),
    #[error("Timesheet with ID {0} not found")]
    TimesheetNotFound(i32),
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    #[error("User with ID {0} not found")]
    UserNotFound(i32),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct TimesheetService<'a> {
    db: &'a DatabaseConnection,
}

impl TimesheetService<'_> {
    pub fn new(db: &DatabaseConnection) -> TimesheetService<'_> {
        TimesheetService { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn log_time(
        &self,
        caller_id: i32,
        new_timesheet: NewTimesheet,
    ) -> Result<timesheet::Model, TimesheetServiceError> {
        let task_id = new_timesheet
            .task_id
            .ok_or(TimesheetServiceError::MissingField("taskId"))?;
        let minutes = new_timesheet
            .minutes
            .ok_or(TimesheetServiceError::MissingField("minutes"))?;
        check_minutes(minutes)?;
        let user_id = new_timesheet.user_id.unwrap_or(caller_id);

        task::Entity::find_by_id(task_id)
            .one(self.db)
            .await?
            .ok_or(TimesheetServiceError::TaskNotFound(task_id))?;
        user::Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or(TimesheetServiceError::UserNotFound(user_id))?;

        let active_model = timesheet::ActiveModel {
            task_id: ActiveValue::Set(task_id),
            user_id: ActiveValue::Set(user_id),
            minutes: ActiveValue::Set(minutes),
            description: ActiveValue::Set(new_timesheet.description),
            is_billable: ActiveValue::Set(new_timesheet.is_billable.unwrap_or(true)),
            date: ActiveValue::Set(
                new_timesheet
                    .date
                    .unwrap_or_else(|| chrono::Utc::now().date_naive()),
            ),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    /// Lists entries, most recent day first.
    #[tracing::instrument(skip(self))]
    pub async fn list_timesheets(
        &self,
        task_id: Option<i32>,
    ) -> Result<Vec<timesheet::Model>, TimesheetServiceError> {
        let mut query = timesheet::Entity::find()
            .order_by_desc(timesheet::Column::Date)
            .order_by_desc(timesheet::Column::Id);
        if let Some(task_id) = task_id {
            query = query.filter(timesheet::Column::TaskId.eq(task_id));
        }
        Ok(query.all(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_timesheet(
        &self,
        id: i32,
    ) -> Result<timesheet::Model, TimesheetServiceError> {
        timesheet::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TimesheetServiceError::TimesheetNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_timesheet(
        &self,
        id: i32,
        changes: TimesheetChanges,
    ) -> Result<timesheet::Model, TimesheetServiceError> {
        let mut active_model: timesheet::ActiveModel = self.get_timesheet(id).await?.into();

        if let Some(minutes) = changes.minutes {
            check_minutes(minutes)?;
            active_model.minutes = ActiveValue::Set(minutes);
        }
        if let Some(description) = changes.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(is_billable) = changes.is_billable {
            active_model.is_billable = ActiveValue::Set(is_billable);
        }
        if let Some(date) = changes.date {
            active_model.date = ActiveValue::Set(date);
        }

        Ok(active_model.update(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_timesheet(&self, id: i32) -> Result<(), TimesheetServiceError> {
        let result = timesheet::Entity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(TimesheetServiceError::TimesheetNotFound(id));
        }
        Ok(())
    }
}

fn check_minutes(minutes: i32) -> Result<(), TimesheetServiceError> {
    if minutes > 0 {
        Ok(())
    } else {
        Err(TimesheetServiceError::InvalidMinutes(minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_positive_minutes_count() {
        assert!(check_minutes(1).is_ok());
        assert!(matches!(
            check_minutes(0),
            Err(TimesheetServiceError::InvalidMinutes(0))
        ));
        assert!(check_minutes(-30).is_err());
    }

    #[test]
    fn can_parse_entry_with_timestamp_date() {
        let entry: NewTimesheet = serde_json::from_str(
            r#"{"taskId": "5", "minutes": 90, "date": "2025-10-01T08:30:00.000Z"}"#,
        )
        .unwrap();

        assert_eq!(entry.task_id, Some(5));
        assert_eq!(entry.user_id, None);
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2025, 10, 1));
        assert_eq!(entry.is_billable, None);
    }
}
