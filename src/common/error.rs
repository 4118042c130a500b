// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

pub const LOGIN_ROUTE: &str = "/admin/login";

// Nosso tipo de erro interno. Os handlers convertem para ApiError (já traduzido).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido ou ausente")]
    InvalidToken,

    #[error("Usuário sem papel de administrador")]
    AccessDenied,

    #[error("Sessão não pôde ser verificada")]
    SessionUnavailable,

    #[error("Lead {0} não encontrado")]
    LeadNotFound(Uuid),

    #[error("Propriedade {0} não encontrada")]
    PropertyNotFound(Uuid),

    #[error("Tipo de arquivo não permitido: {0}")]
    InvalidImageType(String),

    #[error("Imagem de {0} bytes excede o limite")]
    ImageTooLarge(usize),

    #[error("Nenhum arquivo enviado")]
    MissingFile,

    #[error("Falha no upload da imagem: {0}")]
    UploadFailed(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Erro pronto para o cliente: status, mensagem traduzida e detalhes opcionais.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Cria um ValidationErrors com um único campo, para regras que o derive não cobre.
pub fn field_error(field: &'static str, code: &'static str) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new(code));
    AppError::ValidationError(errors)
}

impl AppError {
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let t = |key: &str| store.translate(lang, key);

        let (status, key, details) = match self {
            AppError::ValidationError(errors) => {
                let mut fields = Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            // A mensagem do derive é um código ("required", "too_long"...)
                            let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                            Value::String(t(&format!("validation.{}", code)))
                        })
                        .collect();
                    fields.insert(to_camel_case(&field), Value::Array(messages));
                }
                (StatusCode::BAD_REQUEST, "error.validation", Some(Value::Object(fields)))
            }
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "error.email_already_exists", None),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "error.invalid_credentials", None),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "error.login_required",
                Some(json!({ "redirect": LOGIN_ROUTE })),
            ),
            AppError::AccessDenied => (StatusCode::FORBIDDEN, "error.access_denied", None),
            AppError::SessionUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "error.internal", None),
            AppError::LeadNotFound(_) => (
                StatusCode::NOT_FOUND,
                "error.lead_not_found",
                Some(json!({ "backTo": "/admin/leads" })),
            ),
            AppError::PropertyNotFound(_) => (
                StatusCode::NOT_FOUND,
                "error.property_not_found",
                Some(json!({ "backTo": "/admin/properties" })),
            ),
            AppError::InvalidImageType(_) => (StatusCode::BAD_REQUEST, "error.invalid_image_type", None),
            AppError::ImageTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "error.image_too_large", None),
            AppError::MissingFile => (StatusCode::BAD_REQUEST, "error.missing_file", None),
            AppError::UploadFailed(_) => {
                tracing::error!("Falha no storage: {}", self);
                (StatusCode::BAD_GATEWAY, "error.upload_failed", None)
            }

            // Todos os outros erros viram 500 com mensagem genérica; o detalhe fica no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "error.internal", None)
            }
        };

        ApiError {
            status,
            error: t(key),
            details,
        }
    }
}

// "property_type" -> "propertyType", para casar com os nomes do JSON
fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn es() -> Locale {
        Locale("es".to_string())
    }

    #[test]
    fn test_validation_error_is_field_scoped() {
        let store = I18nStore::load().unwrap();
        let api = field_error("property_type", "invalid_property_type").to_api_error(&es(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        let messages = details["propertyType"].as_array().unwrap();
        assert_eq!(messages[0], "Selecciona un tipo de propiedad válido.");
    }

    #[test]
    fn test_not_found_links_back_to_list() {
        let store = I18nStore::load().unwrap();
        let api = AppError::LeadNotFound(Uuid::new_v4()).to_api_error(&es(), &store);

        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.details.unwrap()["backTo"], "/admin/leads");
    }

    #[test]
    fn test_missing_session_redirects_to_login() {
        let store = I18nStore::load().unwrap();
        let api = AppError::InvalidToken.to_api_error(&es(), &store);

        assert_eq!(api.status, StatusCode::UNAUTHORIZED);
        assert_eq!(api.details.unwrap()["redirect"], LOGIN_ROUTE);
    }

    #[test]
    fn test_backend_failure_is_generic() {
        let store = I18nStore::load().unwrap();
        let api = AppError::DatabaseError(sqlx::Error::PoolTimedOut)
            .to_api_error(&Locale("en".to_string()), &store);

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred. Please try again.");
        assert!(api.details.is_none());
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("budget_max"), "budgetMax");
        assert_eq!(to_camel_case("name"), "name");
    }
}
