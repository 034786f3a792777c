use projectdesk_server::entities::team_member;
use projectdesk_server::role::Role;
use projectdesk_server::team::{
    NewTeam, NewTeamMember, TeamChanges, TeamService, TeamServiceError,
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use testcontainers_modules::{postgres, testcontainers};

mod common;

pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
    pub user_ids: Vec<i32>,
}

async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container().await?;
    let db = common::setup_db(&container).await?;
    let mut user_ids = Vec::new();
    for email in ["ana@example.com", "ben@example.com", "cy@example.com"] {
        user_ids.push(common::create_user(&db, email, Role::TeamMember).await.id);
    }
    Ok(TestContext {
        container,
        db,
        user_ids,
    })
}

async fn membership_count(db: &DatabaseConnection) -> u64 {
    team_member::Entity::find()
        .count(db)
        .await
        .expect("Failed to count memberships")
}

fn member_user_ids(details: &projectdesk_server::team::TeamDetails) -> Vec<i32> {
    details.members.iter().map(|m| m.user.id).collect()
}

#[tokio::test]
async fn can_create_team_with_members() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TeamService::new(&ctx.db);

    let team = service
        .create_team(NewTeam {
            name: Some("Platform".to_string()),
            member_ids: Some(vec![ctx.user_ids[1], ctx.user_ids[0], ctx.user_ids[1]]),
        })
        .await
        .expect("Failed to create team");

    assert_eq!(team.team.name, "Platform");
    let mut ids = member_user_ids(&team);
    ids.sort();
    assert_eq!(ids, vec![ctx.user_ids[0], ctx.user_ids[1]]);

    let fetched = service.get_team(team.team.id).await.expect("Failed to get team");
    assert_eq!(fetched, team);
}

#[tokio::test]
async fn can_reject_team_without_name() {
    let ctx = setup().await.expect("Failed to setup test context");

    let result = TeamService::new(&ctx.db)
        .create_team(NewTeam {
            name: Some("  ".to_string()),
            member_ids: None,
        })
        .await;

    assert!(matches!(result, Err(TeamServiceError::MissingField("name"))));
}

#[tokio::test]
async fn unknown_member_leaves_no_team_behind() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TeamService::new(&ctx.db);

    let result = service
        .create_team(NewTeam {
            name: Some("Ghosts".to_string()),
            member_ids: Some(vec![ctx.user_ids[0], 9999]),
        })
        .await;

    assert!(matches!(result, Err(TeamServiceError::UserNotFound(9999))));
    assert!(service.list_teams().await.expect("Failed to list teams").is_empty());
    assert_eq!(membership_count(&ctx.db).await, 0);
}

#[tokio::test]
async fn can_replace_members_on_update() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TeamService::new(&ctx.db);
    let team = service
        .create_team(NewTeam {
            name: Some("Platform".to_string()),
            member_ids: Some(vec![ctx.user_ids[0], ctx.user_ids[1]]),
        })
        .await
        .expect("Failed to create team");

    let updated = service
        .update_team(
            team.team.id,
            TeamChanges {
                name: Some("Infra".to_string()),
                member_ids: Some(vec![ctx.user_ids[2]]),
            },
        )
        .await
        .expect("Failed to update team");

    assert_eq!(updated.team.name, "Infra");
    assert_eq!(member_user_ids(&updated), vec![ctx.user_ids[2]]);
    assert_eq!(membership_count(&ctx.db).await, 1);

    let renamed_only = service
        .update_team(
            team.team.id,
            TeamChanges {
                name: Some("Core".to_string()),
                member_ids: None,
            },
        )
        .await
        .expect("Failed to update team");
    assert_eq!(member_user_ids(&renamed_only), vec![ctx.user_ids[2]]);
}

#[tokio::test]
async fn can_add_and_remove_single_members() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TeamService::new(&ctx.db);
    let team = service
        .create_team(NewTeam {
            name: Some("Platform".to_string()),
            member_ids: None,
        })
        .await
        .expect("Failed to create team");

    let member = service
        .add_member(NewTeamMember {
            team_id: Some(team.team.id),
            user_id: Some(ctx.user_ids[0]),
        })
        .await
        .expect("Failed to add member");
    assert_eq!(member.user.id, ctx.user_ids[0]);

    let duplicate = service
        .add_member(NewTeamMember {
            team_id: Some(team.team.id),
            user_id: Some(ctx.user_ids[0]),
        })
        .await;
    assert!(matches!(
        duplicate,
        Err(TeamServiceError::AlreadyMember { .. })
    ));

    let listed = service
        .list_members(Some(team.team.id))
        .await
        .expect("Failed to list members");
    assert_eq!(listed, vec![member.clone()]);

    service
        .remove_member(member.member.id)
        .await
        .expect("Failed to remove member");
    assert!(matches!(
        service.get_member(member.member.id).await,
        Err(TeamServiceError::MemberNotFound(_))
    ));
}

#[tokio::test]
async fn can_handle_unknown_team() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TeamService::new(&ctx.db);

    assert!(matches!(
        service.get_team(9999).await,
        Err(TeamServiceError::TeamNotFound(9999))
    ));
    assert!(matches!(
        service.delete_team(9999).await,
        Err(TeamServiceError::TeamNotFound(9999))
    ));
    assert!(matches!(
        service
            .add_member(NewTeamMember {
                team_id: Some(9999),
                user_id: Some(ctx.user_ids[0]),
            })
            .await,
        Err(TeamServiceError::TeamNotFound(9999))
    ));
}

#[tokio::test]
async fn deleting_team_removes_memberships() {
    let ctx = setup().await.expect("Failed to setup test context");
    let service = TeamService::new(&ctx.db);
    let team = service
        .create_team(NewTeam {
            name: Some("Platform".to_string()),
            member_ids: Some(ctx.user_ids.clone()),
        })
        .await
        .expect("Failed to create team");
    assert_eq!(membership_count(&ctx.db).await, 3);

    service
        .delete_team(team.team.id)
        .await
        .expect("Failed to delete team");

    assert_eq!(membership_count(&ctx.db).await, 0);
}
