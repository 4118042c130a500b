// src/handlers/dashboard.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::{db_utils::begin_rls_transaction, error::ApiError},
    config::AppState,
    middleware::{auth::SessionContext, i18n::Locale},
    models::dashboard::{PropertyStats, ReportsOverview},
};

// GET /api/admin/dashboard
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Contagem de imóveis por tipo", body = PropertyStats),
        (status = 401, description = "Sessão ausente"),
        (status = 403, description = "Sem papel de administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let stats = app_state
        .report_service
        .dashboard(&mut tx)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/admin/reports
#[utoipa::path(
    get,
    path = "/api/admin/reports",
    tag = "Dashboard",
    responses(
        (status = 200, description = "KPIs de leads e séries dos gráficos", body = ReportsOverview),
        (status = 401, description = "Sessão ausente"),
        (status = 403, description = "Sem papel de administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_reports(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let overview = app_state
        .report_service
        .reports(&mut tx, &locale.0, &app_state.i18n_store)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(overview)))
}
