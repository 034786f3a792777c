use chrono::NaiveDate;
use projectdesk_server::milestone::{
    MilestoneChanges, MilestoneService, MilestoneServiceError, NewMilestone,
};
use projectdesk_server::role::Role;
use sea_orm::DatabaseConnection;
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

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn milestone(project_id: i32, name: &str, due_date: NaiveDate) -> NewMilestone {
    NewMilestone {
        project_id: Some(project_id),
        name: Some(name.to_string()),
        due_date: Some(due_date),
    }
}

#[tokio::test]
async fn can_create_and_get_milestone() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = MilestoneService::new(&ctx.db);

    let created = service
        .create_milestone(milestone(ctx.project_id, "Design review", date(10, 1)))
        .await
        .expect("Failed to create milestone");

    assert_eq!(created.name, "Design review");
    assert_eq!(created.due_date, date(10, 1));
    let fetched = service
        .get_milestone(created.id)
        .await
        .expect("Failed to get milestone");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn can_reject_missing_fields() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = MilestoneService::new(&ctx.db);

    let result = service
        .create_milestone(NewMilestone {
            project_id: None,
            ..milestone(ctx.project_id, "Design review", date(10, 1))
        })
        .await;
    assert!(matches!(result, Err(MilestoneServiceError::MissingField("projectId"))));

    let result = service
        .create_milestone(milestone(ctx.project_id, " ", date(10, 1)))
        .await;
    assert!(matches!(result, Err(MilestoneServiceError::MissingField("name"))));

    let result = service
        .create_milestone(NewMilestone {
            due_date: None,
            ..milestone(ctx.project_id, "Design review", date(10, 1))
        })
        .await;
    assert!(matches!(result, Err(MilestoneServiceError::MissingField("dueDate"))));
}

#[tokio::test]
async fn can_reject_milestone_in_unknown_project() {
    let ctx = setup().await.expect("Failed to setup test context");

    let result = MilestoneService::new(&ctx.db)
        .create_milestone(milestone(9999, "Design review", date(10, 1)))
        .await;

    assert!(matches!(result, Err(MilestoneServiceError::ProjectNotFound(9999))));
}

#[tokio::test]
async fn lists_milestones_by_due_date() {
    let ctx = setup().await.expect("Failed to setup test context");
    let owner = common::create_user(&ctx.db, "other@example.com", Role::ProjectManager).await;
    let other_project = common::create_project(&ctx.db, owner.id, "Tunnel").await;
    let service = MilestoneService::new(&ctx.db);

    for (project_id, name, due) in [
        (ctx.project_id, "Handover", date(12, 1)),
        (ctx.project_id, "Kick-off", date(9, 1)),
        (other_project.id, "Breakthrough", date(11, 1)),
        (ctx.project_id, "Design review", date(10, 1)),
    ] {
        service
            .create_milestone(milestone(project_id, name, due))
            .await
            .expect("Failed to create milestone");
    }

    let names = |milestones: Vec<projectdesk_server::entities::milestone::Model>| {
        milestones.into_iter().map(|m| m.name).collect::<Vec<_>>()
    };

    let all = service
        .list_milestones(None)
        .await
        .expect("Failed to list milestones");
    assert_eq!(
        names(all),
        vec!["Kick-off", "Design review", "Breakthrough", "Handover"]
    );

    let bridge = service
        .list_milestones(Some(ctx.project_id))
        .await
        .expect("Failed to list milestones");
    assert_eq!(names(bridge), vec!["Kick-off", "Design review", "Handover"]);
}

#[tokio::test]
async fn can_update_milestone_partially() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = MilestoneService::new(&ctx.db);
    let created = service
        .create_milestone(milestone(ctx.project_id, "Design review", date(10, 1)))
        .await
        .expect("Failed to create milestone");

    let updated = service
        .update_milestone(
            created.id,
            MilestoneChanges {
                due_date: Some(date(10, 15)),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update milestone");

    assert_eq!(updated.name, "Design review");
    assert_eq!(updated.due_date, date(10, 15));

    let result = service
        .update_milestone(
            created.id,
            MilestoneChanges {
                name: Some(String::new()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(MilestoneServiceError::MissingField("name"))));
}

#[tokio::test]
async fn can_handle_unknown_milestone() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = MilestoneService::new(&ctx.db);

    let result = service.get_milestone(9999).await;
    assert!(matches!(result, Err(MilestoneServiceError::MilestoneNotFound(9999))));

    let result = service
        .update_milestone(9999, MilestoneChanges::default())
        .await;
    assert!(matches!(result, Err(MilestoneServiceError::MilestoneNotFound(9999))));

    let result = service.delete_milestone(9999).await;
    assert!(matches!(result, Err(MilestoneServiceError::MilestoneNotFound(9999))));
}

#[tokio::test]
async fn can_delete_milestone() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = MilestoneService::new(&ctx.db);
    let created = service
        .create_milestone(milestone(ctx.project_id, "Design review", date(10, 1)))
        .await
        .expect("Failed to create milestone");

    service
        .delete_milestone(created.id)
        .await
        .expect("Failed to delete milestone");

    assert!(matches!(
        service.get_milestone(created.id).await,
        Err(MilestoneServiceError::MilestoneNotFound(_))
    ));
}
