use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20250901_000001_create_users_table::Users;
use crate::m20250901_000002_create_projects_table::Projects;
use crate::m20250901_000003_create_tasks_table::Tasks;
use crate::m20251020_000005_create_comments_table::Comments;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_ATTACHMENTS_TO_USERS: &str = "fk-attachments-uploaded_by_id";
const FK_ATTACHMENTS_TO_PROJECTS: &str = "fk-attachments-project_id";
const FK_ATTACHMENTS_TO_TASKS: &str = "fk-attachments-task_id";
const FK_ATTACHMENTS_TO_COMMENTS: &str = "fk-attachments-comment_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(pk_auto(Attachments::Id))
                    .col(string(Attachments::FileName))
                    .col(string(Attachments::FilePath))
                    .col(integer_null(Attachments::UploadedById))
                    .col(integer_null(Attachments::ProjectId))
                    .col(integer_null(Attachments::TaskId))
                    .col(integer_null(Attachments::CommentId))
                    .col(
                        timestamp_with_time_zone(Attachments::UploadedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_ATTACHMENTS_TO_USERS)
                            .from(Attachments::Table, Attachments::UploadedById)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_ATTACHMENTS_TO_PROJECTS)
                            .from(Attachments::Table, Attachments::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_ATTACHMENTS_TO_TASKS)
                            .from(Attachments::Table, Attachments::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_ATTACHMENTS_TO_COMMENTS)
                            .from(Attachments::Table, Attachments::CommentId)
                            .to(Comments::Table, Comments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attachments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Attachments {
    Table,
    Id,
    FileName,
    FilePath,
    UploadedById,
    ProjectId,
    TaskId,
    CommentId,
    UploadedAt,
}
