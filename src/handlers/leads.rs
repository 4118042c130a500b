// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::SessionContext, i18n::Locale},
    models::{
        interaction::{CreateInteractionPayload, InteractionView},
        lead::{CreateLeadPayload, Lead, LeadDetail, LeadListQuery, UpdateLeadPayload},
    },
};

// =============================================================================
//  LEADS
// =============================================================================

// GET /api/admin/leads
#[utoipa::path(
    get,
    path = "/api/admin/leads",
    tag = "Leads",
    params(LeadListQuery),
    responses(
        (status = 200, description = "Leads do mais novo ao mais antigo, filtrados", body = Vec<Lead>),
        (status = 400, description = "Filtro inválido"),
        (status = 401, description = "Sessão ausente"),
        (status = 403, description = "Sem papel de administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Query(query): Query<LeadListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query
        .into_filter()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let leads = app_state
        .lead_service
        .list(&mut tx, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(leads)))
}

// POST /api/admin/leads
#[utoipa::path(
    post,
    path = "/api/admin/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead cadastrado manualmente", body = Lead),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let new_lead = payload
        .into_new_lead()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .create_manual(tx, new_lead)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/admin/leads/{id}
#[utoipa::path(
    get,
    path = "/api/admin/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead, interações e imóveis sugeridos", body = LeadDetail),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .lead_service
        .detail(&mut tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PATCH /api/admin/leads/{id}
#[utoipa::path(
    patch,
    path = "/api/admin/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Status e notas salvos", body = Lead),
        (status = 400, description = "Status inválido"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .update(tx, id, &payload.status, payload.notes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// DELETE /api/admin/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 204, description = "Lead excluído"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .lead_service
        .delete(tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  INTERAÇÕES
// =============================================================================

// GET /api/admin/leads/{id}/interactions
#[utoipa::path(
    get,
    path = "/api/admin/leads/{id}/interactions",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Interações da mais nova à mais antiga", body = Vec<InteractionView>),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_interactions(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let interactions = app_state
        .lead_service
        .list_interactions(&mut tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(interactions)))
}

// POST /api/admin/leads/{id}/interactions
#[utoipa::path(
    post,
    path = "/api/admin/leads/{id}/interactions",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = CreateInteractionPayload,
    responses(
        (status = 201, description = "Interação registrada", body = InteractionView),
        (status = 400, description = "Tipo ou data inválidos"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_interaction(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateInteractionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let new_interaction = payload
        .into_new_interaction()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let interaction = app_state
        .lead_service
        .add_interaction(tx, id, new_interaction)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(interaction)))
}
