use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20250901_000002_create_projects_table::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_MILESTONES_TO_PROJECTS: &str = "fk-milestones-project_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Milestones::Table)
                    .if_not_exists()
                    .col(pk_auto(Milestones::Id))
                    .col(integer(Milestones::ProjectId))
                    .col(string(Milestones::Name))
                    .col(date(Milestones::DueDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_MILESTONES_TO_PROJECTS)
                            .from(Milestones::Table, Milestones::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Milestones::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Milestones {
    Table,
    Id,
    ProjectId,
    Name,
    DueDate,
}
