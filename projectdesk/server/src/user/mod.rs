use crate::entities::*;
use crate::role::Role;
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

pub mod api;

/// Fields accepted when creating a user.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Error type for UserService operations.
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("User with ID {0} not found")]
    UserNotFound(i32),
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub struct UserService<'a> {
    db: &'a DatabaseConnection,
}

impl UserService<'_> {
    pub fn new(db: &DatabaseConnection) -> UserService<'_> {
        UserService { db }
    }

    /// Creates a user. The role defaults to TEAM_MEMBER.
    #[tracing::instrument(skip(self))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<user::Model, UserServiceError> {
        let name = new_user
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(UserServiceError::MissingField("name"))?;
        let email = new_user
            .email
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .ok_or(UserServiceError::MissingField("email"))?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(UserServiceError::DuplicateEmail(email));
        }

        let active_model = user::ActiveModel {
            name: ActiveValue::Set(name),
            email: ActiveValue::Set(email),
            role: ActiveValue::Set(new_user.role.unwrap_or(Role::TeamMember)),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<user::Model>, UserServiceError> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(self.db)
            .await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, id: i32) -> Result<user::Model, UserServiceError> {
        user::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(UserServiceError::UserNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, UserServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.db)
            .await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_role(&self, id: i32, role: Role) -> Result<user::Model, UserServiceError> {
        let mut active_model: user::ActiveModel = self.get_user(id).await?.into();
        active_model.role = ActiveValue::Set(role);
        Ok(active_model.update(self.db).await?)
    }

    /// Returns the user with `email`, creating it with `name` and `role` when missing.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
    ) -> Result<user::Model, UserServiceError> {
        if let Some(existing) = self.find_by_email(email).await? {
            return Ok(existing);
        }

        tracing::info!("Creating user {}", email);
        self.create_user(NewUser {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            role: Some(role),
        })
        .await
    }
}
