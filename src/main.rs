//src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::{admin_guard, session_middleware};
use crate::services::storage::MAX_IMAGE_BYTES;

// Folga para o envelope multipart além do arquivo
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new().await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let bypasses_rls: bool =
        sqlx::query_scalar("SELECT rolsuper OR rolbypassrls FROM pg_roles WHERE rolname = current_user")
            .fetch_one(&app_state.db_pool)
            .await?;
    if bypasses_rls {
        tracing::warn!("⚠️ O usuário do banco é superuser/BYPASSRLS: as policies de RLS não serão aplicadas");
    }

    if let Some((email, password)) = &app_state.settings.bootstrap_admin {
        app_state.auth_service.ensure_bootstrap_admin(email, password).await?;
    }

    let app = build_router(app_state.clone());

    // Inicia o servidor
    let listener = TcpListener::bind(&app_state.settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/session", get(handlers::auth::get_session));

    // Área administrativa: tudo passa pela guarda de admin
    let admin_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/reports", get(handlers::dashboard::get_reports))
        .route(
            "/properties",
            get(handlers::properties::list_properties).post(handlers::properties::create_property),
        )
        .route(
            "/properties/images",
            post(handlers::properties::upload_property_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/properties/{id}",
            get(handlers::properties::get_property)
                .put(handlers::properties::update_property)
                .delete(handlers::properties::delete_property),
        )
        .route(
            "/leads",
            get(handlers::leads::list_leads).post(handlers::leads::create_lead),
        )
        .route(
            "/leads/{id}",
            get(handlers::leads::get_lead)
                .patch(handlers::leads::update_lead)
                .delete(handlers::leads::delete_lead),
        )
        .route(
            "/leads/{id}/interactions",
            get(handlers::leads::list_interactions).post(handlers::leads::create_interaction),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), admin_guard));

    let storage_dir = app_state.settings.storage_dir.clone();

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/properties", get(handlers::properties::list_catalog))
        .route("/api/contact", post(handlers::contact::submit_contact))
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), session_middleware))
        .nest_service("/storage/property-images", ServeDir::new(storage_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
