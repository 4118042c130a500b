// src/handlers/contact.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::SessionContext, i18n::Locale},
    models::lead::{ContactFormPayload, ContactReceipt, LeadStatus},
};

// POST /api/contact
#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "Público",
    request_body = ContactFormPayload,
    responses(
        (status = 201, description = "Lead registrado", body = ContactReceipt),
        (status = 400, description = "Campos inválidos (nada é gravado)"),
        (status = 500, description = "Falha no servidor; o visitante pode tentar de novo")
    )
)]
pub async fn submit_contact(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Json(payload): Json<ContactFormPayload>,
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

    let id = app_state
        .lead_service
        .submit_contact(tx, new_lead)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let receipt = ContactReceipt {
        id,
        status: LeadStatus::Nuevo,
        message: app_state.i18n_store.translate(&locale.0, "contact.received"),
    };

    Ok((StatusCode::CREATED, Json(receipt)))
}
