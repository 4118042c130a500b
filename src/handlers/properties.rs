// src/handlers/properties.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::SessionContext, i18n::Locale},
    models::property::{CatalogCategory, Property, PropertyCard, PropertyPayload},
    services::storage::MAX_IMAGE_BYTES,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Tipo exato (casa, oficina, lote, inversion) ou "all"
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUploadResponse {
    #[schema(example = "http://localhost:3000/storage/property-images/1740787200000-k3j9x2.jpg")]
    pub url: String,
}

// Só para a documentação do corpo multipart
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

// =============================================================================
//  CATÁLOGO PÚBLICO
// =============================================================================

// GET /api/properties
#[utoipa::path(
    get,
    path = "/api/properties",
    tag = "Público",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Imóveis ativos, destaques primeiro", body = Vec<PropertyCard>),
        (status = 400, description = "Categoria inválida")
    )
)]
pub async fn list_catalog(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = CatalogCategory::parse(query.category.as_deref())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cards = app_state
        .property_service
        .catalog(&mut tx, category)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cards)))
}

// =============================================================================
//  ADMIN
// =============================================================================

// GET /api/admin/properties
#[utoipa::path(
    get,
    path = "/api/admin/properties",
    tag = "Propriedades",
    responses(
        (status = 200, description = "Todos os imóveis, mais novos primeiro", body = Vec<Property>),
        (status = 401, description = "Sessão ausente"),
        (status = 403, description = "Sem papel de administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_properties(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let properties = app_state
        .property_service
        .list_all(&mut tx)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(properties)))
}

// GET /api/admin/properties/{id}
#[utoipa::path(
    get,
    path = "/api/admin/properties/{id}",
    tag = "Propriedades",
    params(("id" = Uuid, Path, description = "ID do imóvel")),
    responses(
        (status = 200, description = "Imóvel", body = Property),
        (status = 404, description = "Imóvel não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_property(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let property = app_state
        .property_service
        .get(&mut tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(property)))
}

// POST /api/admin/properties
#[utoipa::path(
    post,
    path = "/api/admin/properties",
    tag = "Propriedades",
    request_body = PropertyPayload,
    responses(
        (status = 201, description = "Imóvel criado", body = Property),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_property(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Json(payload): Json<PropertyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = payload
        .into_input()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let property = app_state
        .property_service
        .create(tx, input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(property)))
}

// PUT /api/admin/properties/{id}
#[utoipa::path(
    put,
    path = "/api/admin/properties/{id}",
    tag = "Propriedades",
    params(("id" = Uuid, Path, description = "ID do imóvel")),
    request_body = PropertyPayload,
    responses(
        (status = 200, description = "Imóvel atualizado", body = Property),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Imóvel não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_property(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<PropertyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = payload
        .into_input()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let property = app_state
        .property_service
        .update(tx, id, input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(property)))
}

// DELETE /api/admin/properties/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/properties/{id}",
    tag = "Propriedades",
    params(("id" = Uuid, Path, description = "ID do imóvel")),
    responses(
        (status = 204, description = "Imóvel excluído"),
        (status = 404, description = "Imóvel não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_property(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = begin_rls_transaction(&app_state, &session)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .property_service
        .delete(tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/admin/properties/images
#[utoipa::path(
    post,
    path = "/api/admin/properties/images",
    tag = "Propriedades",
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Imagem armazenada; a URL vai no image_url do imóvel", body = ImageUploadResponse),
        (status = 400, description = "Arquivo ausente ou que não é imagem"),
        (status = 413, description = "Imagem maior que 5 MB"),
        (status = 502, description = "Falha no storage")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_property_image(
    State(app_state): State<AppState>,
    locale: Locale,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| to_api(multipart_error(e)))? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| to_api(multipart_error(e)))?;
        upload = Some((file_name, content_type, bytes));
        break;
    }

    let (file_name, content_type, bytes) = upload.ok_or_else(|| to_api(AppError::MissingFile))?;

    let url = app_state
        .property_service
        .upload_image(file_name.as_deref(), content_type.as_deref(), bytes.to_vec())
        .await
        .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(ImageUploadResponse { url })))
}

// Corpo acima do limite do axum vira o mesmo erro de imagem grande
fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::ImageTooLarge(MAX_IMAGE_BYTES + 1)
    } else {
        tracing::warn!("Multipart inválido: {}", e);
        AppError::MissingFile
    }
}
