use projectdesk_server::dependency::DependencyService;
use projectdesk_server::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use projectdesk_server::entities::{task, task_dependency};
use projectdesk_server::project::ProjectService;
use projectdesk_server::role::Role;
use projectdesk_server::task::{NewTask, OnTaskDelete, TaskChanges, TaskService, TaskServiceError};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use testcontainers_modules::{postgres, testcontainers};

mod common;

pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
    pub project_id: i32,
}

async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container().await?;
    let db = common::setup_db(&container).await?;
    let owner = common::create_user(&db, "pm@example.com", Role::ProjectManager).await;
    let project = common::create_project(&db, owner.id, "Bridge").await;
    Ok(TestContext {
        container,
        db,
        project_id: project.id,
    })
}

async fn edge_count(db: &DatabaseConnection) -> u64 {
    task_dependency::Entity::find()
        .count(db)
        .await
        .expect("Failed to count dependencies")
}

#[tokio::test]
async fn can_create_task_with_defaults() {
    let ctx = setup().await.expect("Failed to setup test context");

    let created = TaskService::new(&ctx.db)
        .create_task(NewTask {
            project_id: Some(ctx.project_id),
            title: Some("Pour foundations".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to create task");

    assert_eq!(created.title, "Pour foundations");
    assert_eq!(created.status, TaskStatus::ToDo);
    assert_eq!(created.priority, TaskPriority::Medium);
    assert_eq!(created.estimated_hours, 0.0);
    assert_eq!(created.assignee_id, None);
}

#[tokio::test]
async fn can_reject_task_without_title() {
    let ctx = setup().await.expect("Failed to setup test context");

    let result = TaskService::new(&ctx.db)
        .create_task(NewTask {
            project_id: Some(ctx.project_id),
            title: Some("   ".to_string()),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(TaskServiceError::MissingField("title"))));
}

#[tokio::test]
async fn can_reject_task_in_unknown_project() {
    let ctx = setup().await.expect("Failed to setup test context");

    let result = TaskService::new(&ctx.db)
        .create_task(NewTask {
            project_id: Some(9999),
            title: Some("Orphan".to_string()),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(TaskServiceError::ProjectNotFound(9999))));
}

#[tokio::test]
async fn can_update_task_partially() {
    let ctx = setup().await.expect("Failed to setup test context");
    let existing = common::create_task(&ctx.db, ctx.project_id, "Survey").await;

    let updated = TaskService::new(&ctx.db)
        .update_task(
            existing.id,
            TaskChanges {
                status: Some(TaskStatus::InProgress),
                spent_hours: Some(4.5),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update task");

    assert_eq!(updated.title, "Survey");
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.spent_hours, 4.5);
}

#[tokio::test]
async fn can_filter_tasks_by_project() {
    let ctx = setup().await.expect("Failed to setup test context");
    let other_project = common::create_project(&ctx.db, 1, "Tunnel").await;
    let mine = common::create_task(&ctx.db, ctx.project_id, "Survey").await;
    common::create_task(&ctx.db, other_project.id, "Dig").await;

    let listed = TaskService::new(&ctx.db)
        .list_tasks(Some(ctx.project_id))
        .await
        .expect("Failed to list tasks");

    assert_eq!(listed, vec![mine]);
}

#[tokio::test]
async fn cascade_policy_removes_edges_with_the_task() {
    let ctx = setup().await.expect("Failed to setup test context");
    let design = common::create_task(&ctx.db, ctx.project_id, "Design").await;
    let build = common::create_task(&ctx.db, ctx.project_id, "Build").await;
    let test = common::create_task(&ctx.db, ctx.project_id, "Test").await;
    common::create_edge(&ctx.db, build.id, design.id).await;
    common::create_edge(&ctx.db, test.id, build.id).await;

    TaskService::new(&ctx.db)
        .delete_task(build.id, OnTaskDelete::Cascade)
        .await
        .expect("Failed to delete task");

    assert_eq!(edge_count(&ctx.db).await, 0);
    assert!(
        task::Entity::find_by_id(build.id)
            .one(&ctx.db)
            .await
            .expect("Failed to query task")
            .is_none()
    );
}

#[tokio::test]
async fn block_policy_keeps_task_with_edges() {
    let ctx = setup().await.expect("Failed to setup test context");
    let design = common::create_task(&ctx.db, ctx.project_id, "Design").await;
    let build = common::create_task(&ctx.db, ctx.project_id, "Build").await;
    common::create_edge(&ctx.db, build.id, design.id).await;

    let result = TaskService::new(&ctx.db)
        .delete_task(design.id, OnTaskDelete::Block)
        .await;

    assert!(matches!(
        result,
        Err(TaskServiceError::HasDependencies { edges: 1, .. })
    ));
    assert_eq!(edge_count(&ctx.db).await, 1);
    assert!(
        task::Entity::find_by_id(design.id)
            .one(&ctx.db)
            .await
            .expect("Failed to query task")
            .is_some()
    );
}

#[tokio::test]
async fn block_policy_deletes_unconnected_task() {
    let ctx = setup().await.expect("Failed to setup test context");
    let lonely = common::create_task(&ctx.db, ctx.project_id, "Lonely").await;

    let deleted = TaskService::new(&ctx.db)
        .delete_task(lonely.id, OnTaskDelete::Block)
        .await
        .expect("Failed to delete task");

    assert_eq!(deleted, lonely);
}

#[tokio::test]
async fn deleting_a_project_removes_its_tasks_and_edges() {
    let ctx = setup().await.expect("Failed to setup test context");
    let design = common::create_task(&ctx.db, ctx.project_id, "Design").await;
    let build = common::create_task(&ctx.db, ctx.project_id, "Build").await;
    common::create_edge(&ctx.db, build.id, design.id).await;

    ProjectService::new(&ctx.db)
        .delete_project(ctx.project_id)
        .await
        .expect("Failed to delete project");

    assert_eq!(edge_count(&ctx.db).await, 0);
    assert_eq!(
        task::Entity::find()
            .count(&ctx.db)
            .await
            .expect("Failed to count tasks"),
        0
    );
}

#[tokio::test]
async fn can_reject_unknown_assignee_on_create() {
    let ctx = setup().await.expect("Failed to setup test context");

    let result = TaskService::new(&ctx.db)
        .create_task(NewTask {
            project_id: Some(ctx.project_id),
            title: Some("Survey".to_string()),
            assignee_id: Some(9999),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(TaskServiceError::AssigneeNotFound(9999))));
    let tasks = task::Entity::find()
        .count(&ctx.db)
        .await
        .expect("Failed to count tasks");
    assert_eq!(tasks, 0);
}

#[tokio::test]
async fn can_reject_unknown_assignee_on_update() {
    let ctx = setup().await.expect("Failed to setup test context");
    let existing = common::create_task(&ctx.db, ctx.project_id, "Survey").await;

    let result = TaskService::new(&ctx.db)
        .update_task(
            existing.id,
            TaskChanges {
                assignee_id: Some(Some(9999)),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(TaskServiceError::AssigneeNotFound(9999))));
}

#[tokio::test]
async fn can_assign_and_clear_nullable_fields() {
    let ctx = setup().await.expect("Failed to setup test context");
    let existing = common::create_task(&ctx.db, ctx.project_id, "Survey").await;
    let dev = common::create_user(&ctx.db, "dev@example.com", Role::TeamMember).await;
    let service = TaskService::new(&ctx.db);

    let assigned = service
        .update_task(
            existing.id,
            TaskChanges {
                assignee_id: Some(Some(dev.id)),
                description: Some(Some("Measure the site".to_string())),
                due_date: Some(chrono::NaiveDate::from_ymd_opt(2025, 10, 1)),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update task");
    assert_eq!(assigned.assignee_id, Some(dev.id));
    assert!(assigned.due_date.is_some());

    let cleared = service
        .update_task(
            existing.id,
            TaskChanges {
                assignee_id: Some(None),
                description: Some(None),
                due_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update task");
    assert_eq!(cleared.assignee_id, None);
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.due_date, None);
    assert_eq!(cleared.title, "Survey");
}

#[tokio::test]
async fn can_reject_blank_title_on_update() {
    let ctx = setup().await.expect("Failed to setup test context");
    let existing = common::create_task(&ctx.db, ctx.project_id, "Survey").await;

    let result = TaskService::new(&ctx.db)
        .update_task(
            existing.id,
            TaskChanges {
                title: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(TaskServiceError::MissingField("title"))));
    let unchanged = TaskService::new(&ctx.db)
        .get_task(existing.id)
        .await
        .expect("Failed to get task");
    assert_eq!(unchanged.title, "Survey");
}

#[tokio::test]
async fn block_policy_never_loses_a_concurrent_dependency() {
    let ctx = setup().await.expect("Failed to setup test context");

    for round in 0..10 {
        let design = common::create_task(&ctx.db, ctx.project_id, &format!("Design {}", round)).await;
        let build = common::create_task(&ctx.db, ctx.project_id, &format!("Build {}", round)).await;
        let dependencies = DependencyService::new(&ctx.db);
        let tasks = TaskService::new(&ctx.db);

        let (added, deleted) = tokio::join!(
            dependencies.add_dependency(build.id, Some(design.id)),
            tasks.delete_task(design.id, OnTaskDelete::Block),
        );

        // Either the edge won and blocked the delete, or the task was gone
        // before the edge could be stored.
        assert!(
            added.is_ok() != deleted.is_ok(),
            "round {}: added {:?}, deleted {:?}",
            round,
            added.map(|d| d.id()),
            deleted.map(|t| t.id)
        );
    }
}
