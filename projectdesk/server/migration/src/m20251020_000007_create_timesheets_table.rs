use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20250901_000001_create_users_table::Users;
use crate::m20250901_000003_create_tasks_table::Tasks;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_TIMESHEETS_TO_TASKS: &str = "fk-timesheets-task_id";
const FK_TIMESHEETS_TO_USERS: &str = "fk-timesheets-user_id";
const IDX_TIMESHEETS_TASK_ID: &str = "idx-timesheets-task_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Timesheets::Table)
                    .if_not_exists()
                    .col(pk_auto(Timesheets::Id))
                    .col(integer(Timesheets::TaskId))
                    .col(integer(Timesheets::UserId))
                    .col(integer(Timesheets::Minutes))
                    .col(text_null(Timesheets::Description))
                    .col(boolean(Timesheets::IsBillable).default(true))
                    .col(date(Timesheets::Date))
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TIMESHEETS_TO_TASKS)
                            .from(Timesheets::Table, Timesheets::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TIMESHEETS_TO_USERS)
                            .from(Timesheets::Table, Timesheets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_TIMESHEETS_TASK_ID)
                    .table(Timesheets::Table)
                    .col(Timesheets::TaskId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_TIMESHEETS_TASK_ID)
                    .table(Timesheets::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Timesheets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Timesheets {
    Table,
    Id,
    TaskId,
    UserId,
    Minutes,
    Description,
    IsBillable,
    Date,
}
