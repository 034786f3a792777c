use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20250901_000001_create_users_table::Users;
use crate::m20250901_000002_create_projects_table::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_RESOURCES_TO_PROJECTS: &str = "fk-resources-project_id";
const FK_RESOURCES_TO_USERS: &str = "fk-resources-user_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resources::Table)
                    .if_not_exists()
                    .col(pk_auto(Resources::Id))
                    .col(integer(Resources::ProjectId))
                    .col(integer(Resources::UserId))
                    .col(integer(Resources::AllocationPercent).default(100))
                    .col(
                        timestamp_with_time_zone(Resources::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_RESOURCES_TO_PROJECTS)
                            .from(Resources::Table, Resources::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_RESOURCES_TO_USERS)
                            .from(Resources::Table, Resources::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Resources::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Resources {
    Table,
    Id,
    ProjectId,
    UserId,
    AllocationPercent,
    CreatedAt,
}
