#![allow(dead_code)] // each test binary uses a different subset of the helpers

use migration::MigratorTrait;
use projectdesk_server::auth::{AuthState, encode_jwt};
use projectdesk_server::entities::{project, task, task_dependency, user};
use projectdesk_server::role::Role;
use projectdesk_server::task::OnTaskDelete;
use projectdesk_server::web::AppState;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};
use std::sync::Arc;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};

pub const JWT_SECRET: &str = "test_secret";

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Builds application state around `db` with the given task deletion policy.
pub fn app_state(db: DatabaseConnection, on_task_delete: OnTaskDelete) -> AppState {
    AppState {
        db: Arc::new(db),
        auth: Arc::new(AuthState {
            admin_email: "admin@example.com".to_string(),
            admin_password: "password".to_string(),
            admin_user_id: 1,
            jwt_secret: JWT_SECRET.to_string(),
        }),
        on_task_delete,
    }
}

pub fn token_for(user: &user::Model) -> String {
    encode_jwt(user.id, user.role, JWT_SECRET).expect("Failed to encode token")
}

pub async fn create_user(db: &DatabaseConnection, email: &str, role: Role) -> user::Model {
    user::ActiveModel {
        name: ActiveValue::Set(email.split('@').next().unwrap_or(email).to_string()),
        email: ActiveValue::Set(email.to_string()),
        role: ActiveValue::Set(role),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create user")
}

pub async fn create_project(db: &DatabaseConnection, owner_id: i32, name: &str) -> project::Model {
    project::ActiveModel {
        name: ActiveValue::Set(name.to_string()),
        description: ActiveValue::Set(None),
        owner_id: ActiveValue::Set(owner_id),
        start_date: ActiveValue::Set(None),
        due_date: ActiveValue::Set(None),
        budgeted_cost: ActiveValue::Set(0.0),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create project")
}

pub async fn create_task(db: &DatabaseConnection, project_id: i32, title: &str) -> task::Model {
    use projectdesk_server::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};

    task::ActiveModel {
        project_id: ActiveValue::Set(project_id),
        title: ActiveValue::Set(title.to_string()),
        description: ActiveValue::Set(None),
        status: ActiveValue::Set(TaskStatus::ToDo),
        priority: ActiveValue::Set(TaskPriority::Medium),
        assignee_id: ActiveValue::Set(None),
        estimated_hours: ActiveValue::Set(0.0),
        spent_hours: ActiveValue::Set(0.0),
        start_date: ActiveValue::Set(None),
        due_date: ActiveValue::Set(None),
        deliverable_name: ActiveValue::Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create task")
}

/// Inserts the edge `task_id -> depends_on` directly, bypassing every check.
pub async fn create_edge(
    db: &DatabaseConnection,
    task_id: i32,
    depends_on: i32,
) -> task_dependency::Model {
    task_dependency::ActiveModel {
        task_id: ActiveValue::Set(task_id),
        depends_on: ActiveValue::Set(depends_on),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create dependency")
}
