use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20250901_000001_create_users_table::Users;
use crate::m20250901_000002_create_projects_table::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_RISKS_TO_PROJECTS: &str = "fk-risks-project_id";
const FK_RISKS_TO_USERS: &str = "fk-risks-reported_by_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Risks::Table)
                    .if_not_exists()
                    .col(pk_auto(Risks::Id))
                    .col(integer(Risks::ProjectId))
                    .col(string(Risks::Title))
                    .col(text_null(Risks::Description))
                    .col(string(Risks::Severity))
                    .col(text_null(Risks::MitigationPlan))
                    .col(string(Risks::Status).default("OPEN"))
                    .col(integer(Risks::ReportedById))
                    .col(
                        timestamp_with_time_zone(Risks::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_RISKS_TO_PROJECTS)
                            .from(Risks::Table, Risks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_RISKS_TO_USERS)
                            .from(Risks::Table, Risks::ReportedById)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Risks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Risks {
    Table,
    Id,
    ProjectId,
    Title,
    Description,
    Severity,
    MitigationPlan,
    Status,
    ReportedById,
    CreatedAt,
}
