use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20250901_000003_create_tasks_table::Tasks;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_TASK_DEPENDENCIES_TO_TASK: &str = "fk-task_dependencies-task_id";
const FK_TASK_DEPENDENCIES_TO_DEPENDS_ON: &str = "fk-task_dependencies-depends_on";
const UNIQUE_TASK_DEPENDENCY: &str = "task_dependencies_task_id_depends_on_unique";
const IDX_TASK_DEPENDENCIES_DEPENDS_ON: &str = "idx-task_dependencies-depends_on";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TaskDependencies::Table)
                    .if_not_exists()
                    .col(pk_auto(TaskDependencies::Id))
                    .col(integer(TaskDependencies::TaskId))
                    .col(integer(TaskDependencies::DependsOn))
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TASK_DEPENDENCIES_TO_TASK)
                            .from(TaskDependencies::Table, TaskDependencies::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TASK_DEPENDENCIES_TO_DEPENDS_ON)
                            .from(TaskDependencies::Table, TaskDependencies::DependsOn)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // One edge per (task, depends_on) pair
        manager
            .create_index(
                Index::create()
                    .name(UNIQUE_TASK_DEPENDENCY)
                    .table(TaskDependencies::Table)
                    .col(TaskDependencies::TaskId)
                    .col(TaskDependencies::DependsOn)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_TASK_DEPENDENCIES_DEPENDS_ON)
                    .table(TaskDependencies::Table)
                    .col(TaskDependencies::DependsOn)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_TASK_DEPENDENCIES_DEPENDS_ON)
                    .table(TaskDependencies::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name(UNIQUE_TASK_DEPENDENCY)
                    .table(TaskDependencies::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(TaskDependencies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TaskDependencies {
    Table,
    Id,
    TaskId,
    DependsOn,
}
