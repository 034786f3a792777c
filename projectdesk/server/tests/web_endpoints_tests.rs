use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use projectdesk_server::auth::decode_jwt;
use projectdesk_server::entities::user;
use projectdesk_server::role::Role;
use projectdesk_server::task::OnTaskDelete;
use projectdesk_server::web::create_app;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use testcontainers_modules::{postgres, testcontainers};
use tower::ServiceExt;

mod common;

pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
    pub admin: user::Model,
}

async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container().await?;
    let db = common::setup_db(&container).await?;
    let admin = common::create_user(&db, "admin@example.com", Role::Admin).await;
    Ok(TestContext {
        container,
        db,
        admin,
    })
}

async fn send(
    ctx: &TestContext,
    policy: OnTaskDelete,
    token: Option<&str>,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    create_app(common::app_state(ctx.db.clone(), policy))
        .oneshot(request)
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn can_check_health_without_token() {
    let ctx = setup().await.expect("Failed to setup test context");

    let response = send(&ctx, OnTaskDelete::Cascade, None, Method::GET, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn can_login_and_use_cookie() {
    let ctx = setup().await.expect("Failed to setup test context");

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        None,
        Method::POST,
        "/api/v1/login",
        Some(json!({"email": "admin@example.com", "password": "password"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let request = Request::builder()
        .uri("/api/v1/projects")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = create_app(common::app_state(ctx.db.clone(), OnTaskDelete::Cascade))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn can_create_and_fetch_project_with_tasks() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/projects",
        Some(json!({"name": "Bridge", "budgetedCost": 1200.5, "dueDate": "2025-12-31"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let project = body_json(response).await;
    assert_eq!(project["ownerId"], ctx.admin.id);
    assert_eq!(project["dueDate"], "2025-12-31");
    let project_id = project["id"].as_i64().unwrap();

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/tasks",
        Some(json!({"projectId": project_id, "title": "Survey", "priority": "HIGH"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let task = body_json(response).await;
    assert_eq!(task["status"], "TO_DO");
    assert_eq!(task["priority"], "HIGH");

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/milestones",
        Some(json!({"projectId": project_id, "name": "Design review", "dueDate": "2025-10-01"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::GET,
        &format!("/api/v1/projects/{}", project_id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let details = body_json(response).await;
    assert_eq!(details["name"], "Bridge");
    assert_eq!(details["tasks"], json!([task]));
    assert_eq!(details["milestones"][0]["name"], "Design review");
}

#[tokio::test]
async fn can_reject_project_without_name() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/projects",
        Some(json!({"description": "Nameless"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Project name is required", "code": "VALIDATION_ERROR"})
    );
}

#[tokio::test]
async fn team_members_cannot_manage_projects() {
    let ctx = setup().await.expect("Failed to setup test context");
    let member = common::create_user(&ctx.db, "dev@example.com", Role::TeamMember).await;
    let token = common::token_for(&member);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/projects",
        Some(json!({"name": "Side project"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn block_policy_surfaces_as_conflict() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);
    let project = common::create_project(&ctx.db, ctx.admin.id, "Bridge").await;
    let design = common::create_task(&ctx.db, project.id, "Design").await;
    let build = common::create_task(&ctx.db, project.id, "Build").await;
    common::create_edge(&ctx.db, build.id, design.id).await;

    let response = send(
        &ctx,
        OnTaskDelete::Block,
        Some(&token),
        Method::DELETE,
        &format!("/api/v1/tasks/{}", design.id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::DELETE,
        &format!("/api/v1/tasks/{}", design.id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"success": true}));
}

#[tokio::test]
async fn admin_can_create_user_and_issue_token() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/admin/users",
        Some(json!({"name": "Casey", "email": "casey@example.com", "role": "CLIENT"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["role"], "CLIENT");
    let user_id = created["id"].as_i64().unwrap();

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/admin/users",
        Some(json!({"name": "Casey again", "email": "casey@example.com"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::PUT,
        &format!("/api/v1/admin/users/{}/role", user_id),
        Some(json!({"role": "TEAM_MEMBER"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        &format!("/api/v1/admin/users/{}/token", user_id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let issued = body_json(response).await;
    let claims = decode_jwt(issued["token"].as_str().unwrap(), common::JWT_SECRET).unwrap();
    assert_eq!(i64::from(claims.user_id), user_id);
    assert_eq!(claims.role, Role::TeamMember);
}

#[tokio::test]
async fn only_admins_manage_users() {
    let ctx = setup().await.expect("Failed to setup test context");
    let manager = common::create_user(&ctx.db, "pm@example.com", Role::ProjectManager).await;
    let token = common::token_for(&manager);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::GET,
        "/api/v1/admin/users",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dashboard_follows_the_callers_role() {
    let ctx = setup().await.expect("Failed to setup test context");
    let client = common::create_user(&ctx.db, "client@example.com", Role::Client).await;
    let token = common::token_for(&client);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::GET,
        "/dashboard",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/client-portal");

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::GET,
        "/manager/dashboard",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/client-portal");

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::GET,
        "/client-portal",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "CLIENT");
}

#[tokio::test]
async fn dashboard_requires_authentication() {
    let ctx = setup().await.expect("Failed to setup test context");

    let response = send(&ctx, OnTaskDelete::Cascade, None, Method::GET, "/dashboard", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn can_handle_update_and_delete_of_unknown_project() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::PUT,
        "/api/v1/projects/9999",
        Some(json!({"name": "Renamed"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Project with ID 9999 not found", "code": "NOT_FOUND"})
    );

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::DELETE,
        "/api/v1/projects/9999",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn can_handle_role_change_of_unknown_user() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::PUT,
        "/api/v1/admin/users/9999/role",
        Some(json!({"role": "CLIENT"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "User with ID 9999 not found", "code": "NOT_FOUND"})
    );
}

#[tokio::test]
async fn can_reject_task_with_unknown_assignee() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);
    let project = common::create_project(&ctx.db, ctx.admin.id, "Bridge").await;

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/tasks",
        Some(json!({"projectId": project.id, "title": "Survey", "assigneeId": 9999})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Assignee with ID 9999 not found", "code": "NOT_FOUND"})
    );
}

#[tokio::test]
async fn can_create_team_with_member_ids() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);
    let member = common::create_user(&ctx.db, "dev@example.com", Role::TeamMember).await;

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/teams",
        Some(json!({"name": "Platform", "memberIds": [member.id]})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let team = body_json(response).await;
    assert_eq!(team["name"], "Platform");
    assert_eq!(team["members"][0]["userId"], member.id);
    assert_eq!(team["members"][0]["user"]["email"], "dev@example.com");

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/team-members",
        Some(json!({"teamId": team["id"], "userId": member.id})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn can_reject_team_with_unknown_member() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/teams",
        Some(json!({"name": "Ghosts", "memberIds": [9999]})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "User with ID 9999 not found", "code": "NOT_FOUND"})
    );
}

#[tokio::test]
async fn accepts_form_style_risk() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);
    let project = common::create_project(&ctx.db, ctx.admin.id, "Bridge").await;

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/risks",
        Some(json!({
            "projectId": project.id.to_string(),
            "title": "Flood",
            "severity": "CRITICAL",
            "reportedById": ""
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let risk = body_json(response).await;
    assert_eq!(risk["projectId"], project.id);
    assert_eq!(risk["status"], "OPEN");
    assert_eq!(risk["reportedById"], ctx.admin.id);
}

#[tokio::test]
async fn team_members_log_time_but_cannot_manage_risks() {
    let ctx = setup().await.expect("Failed to setup test context");
    let member = common::create_user(&ctx.db, "dev@example.com", Role::TeamMember).await;
    let token = common::token_for(&member);
    let project = common::create_project(&ctx.db, ctx.admin.id, "Bridge").await;
    let task = common::create_task(&ctx.db, project.id, "Survey").await;

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/timesheets",
        Some(json!({"taskId": task.id, "minutes": 30, "date": "2025-10-01"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let entry = body_json(response).await;
    assert_eq!(entry["userId"], member.id);
    assert_eq!(entry["date"], "2025-10-01");
    assert_eq!(entry["isBillable"], true);

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/risks",
        Some(json!({"projectId": project.id, "title": "Flood", "severity": "LOW"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn can_reject_out_of_range_allocation() {
    let ctx = setup().await.expect("Failed to setup test context");
    let token = common::token_for(&ctx.admin);
    let project = common::create_project(&ctx.db, ctx.admin.id, "Bridge").await;

    let response = send(
        &ctx,
        OnTaskDelete::Cascade,
        Some(&token),
        Method::POST,
        "/api/v1/resources",
        Some(json!({"projectId": project.id, "userId": ctx.admin.id, "allocationPercent": 150})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "allocationPercent must be between 1 and 100, got 150",
            "code": "VALIDATION_ERROR"
        })
    );
}
