pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_users_table;
mod m20250901_000002_create_projects_table;
mod m20250901_000003_create_tasks_table;
mod m20250901_000004_create_task_dependencies_table;
mod m20250914_000001_create_milestones_table;
mod m20251020_000001_create_risks_table;
mod m20251020_000002_create_resources_table;
mod m20251020_000003_create_teams_table;
mod m20251020_000004_create_team_members_table;
mod m20251020_000005_create_comments_table;
mod m20251020_000006_create_attachments_table;
mod m20251020_000007_create_timesheets_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_users_table::Migration),
            Box::new(m20250901_000002_create_projects_table::Migration),
            Box::new(m20250901_000003_create_tasks_table::Migration),
            Box::new(m20250901_000004_create_task_dependencies_table::Migration),
            Box::new(m20250914_000001_create_milestones_table::Migration),
            Box::new(m20251020_000001_create_risks_table::Migration),
            Box::new(m20251020_000002_create_resources_table::Migration),
            Box::new(m20251020_000003_create_teams_table::Migration),
            Box::new(m20251020_000004_create_team_members_table::Migration),
            Box::new(m20251020_000005_create_comments_table::Migration),
            Box::new(m20251020_000006_create_attachments_table::Migration),
            Box::new(m20251020_000007_create_timesheets_table::Migration),
        ]
    }
}
