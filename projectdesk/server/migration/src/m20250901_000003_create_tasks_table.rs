use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20250901_000001_create_users_table::Users;
use crate::m20250901_000002_create_projects_table::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_TASKS_TO_PROJECTS: &str = "fk-tasks-project_id";
const FK_TASKS_TO_USERS: &str = "fk-tasks-assignee_id";
const IDX_TASKS_PROJECT_ID: &str = "idx-tasks-project_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(pk_auto(Tasks::Id))
                    .col(integer(Tasks::ProjectId))
                    .col(string(Tasks::Title))
                    .col(text_null(Tasks::Description))
                    .col(string(Tasks::Status).default("TO_DO"))
                    .col(string(Tasks::Priority).default("MEDIUM"))
                    .col(integer_null(Tasks::AssigneeId))
                    .col(double(Tasks::EstimatedHours).default(0.0))
                    .col(double(Tasks::SpentHours).default(0.0))
                    .col(date_null(Tasks::StartDate))
                    .col(date_null(Tasks::DueDate))
                    .col(string_null(Tasks::DeliverableName))
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TASKS_TO_PROJECTS)
                            .from(Tasks::Table, Tasks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TASKS_TO_USERS)
                            .from(Tasks::Table, Tasks::AssigneeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_TASKS_PROJECT_ID)
                    .table(Tasks::Table)
                    .col(Tasks::ProjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_TASKS_PROJECT_ID)
                    .table(Tasks::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Tasks {
    Table,
    Id,
    ProjectId,
    Title,
    Description,
    Status,
    Priority,
    AssigneeId,
    EstimatedHours,
    SpentHours,
    StartDate,
    DueDate,
    DeliverableName,
}
