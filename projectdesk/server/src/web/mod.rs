use axum::Router;
use axum::middleware::from_fn_with_state;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthState, auth_user_middleware};
use crate::config::Config;
use crate::role::Role;
use crate::task::OnTaskDelete;
use crate::user::UserService;

pub mod api;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthState>,
    /// What deleting a task does to its dependency edges.
    pub on_task_delete: OnTaskDelete,
}

/// Builds the complete application router: JSON API, dashboards, health check and API docs.
pub fn create_app(state: AppState) -> Router {
    let auth_state = state.auth.clone();

    Router::new()
        .merge(api::create_api_router(state))
        .merge(crate::dashboard::create_router())
        .route("/health", axum::routing::get(health_check_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new())
                .layer(from_fn_with_state(auth_state, auth_user_middleware)),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let admin = UserService::new(&db)
        .ensure_user(&config.admin_email, "Administrator", Role::Admin)
        .await?;
    if admin.role != Role::Admin {
        tracing::warn!(
            "Configured admin {} is stored with role {:?}",
            admin.email,
            admin.role
        );
    }

    let state = AppState {
        db: Arc::new(db),
        auth: Arc::new(AuthState::from_config(&config, admin.id)),
        on_task_delete: config.on_task_delete,
    };
    tracing::info!("Task deletion policy: {:?}", state.on_task_delete);

    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
