// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{AppRole, User},
};

// ---
// Contexto de sessão resolvido por requisição
// ---
/// Ciclo de vida: `Unauthenticated` -> `Loading` (token em verificação) -> `Authenticated`.
/// Se a verificação não conclui (banco indisponível) a sessão fica em `Loading`:
/// rotas públicas seguem como anônimo e a guarda de admin responde 503.
#[derive(Debug, Clone, Default)]
pub enum SessionContext {
    #[default]
    Unauthenticated,
    Loading,
    Authenticated { user: User, role: AppRole },
}

impl SessionContext {
    pub fn authenticated(&self) -> Option<(&User, AppRole)> {
        match self {
            SessionContext::Authenticated { user, role } => Some((user, *role)),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, SessionContext::Authenticated { role: AppRole::Admin, .. })
    }

    pub fn state_label(&self) -> &'static str {
        match self {
            SessionContext::Unauthenticated => "unauthenticated",
            SessionContext::Loading => "loading",
            SessionContext::Authenticated { .. } => "authenticated",
        }
    }
}

/// Sem sessão -> 401 (com redirect para o login); sessão sem papel admin -> 403.
pub fn require_admin(session: &SessionContext) -> Result<&User, AppError> {
    match session {
        SessionContext::Authenticated { user, role: AppRole::Admin } => Ok(user),
        SessionContext::Authenticated { .. } => Err(AppError::AccessDenied),
        SessionContext::Loading => Err(AppError::SessionUnavailable),
        SessionContext::Unauthenticated => Err(AppError::InvalidToken),
    }
}

// ---
// Middleware global: resolve o Bearer token e guarda a sessão nas extensions
// ---
pub async fn session_middleware(State(app_state): State<AppState>, mut request: Request, next: Next) -> Response {
    let session = match request.headers().typed_get::<Authorization<Bearer>>() {
        None => SessionContext::Unauthenticated,
        Some(Authorization(bearer)) => resolve_or_pending(&app_state, bearer.token()).await,
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}

async fn resolve_or_pending(app_state: &AppState, token: &str) -> SessionContext {
    match app_state.auth_service.resolve_session(token).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Falha ao verificar a sessão: {}", e);
            SessionContext::Loading
        }
    }
}

// ---
// Guarda das rotas /api/admin
// ---
pub async fn admin_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    session: SessionContext,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(e) = require_admin(&session) {
        tracing::warn!(state = session.state_label(), path = %request.uri().path(), "Acesso admin negado");
        return Err(e.to_api_error(&locale, &app_state.i18n_store));
    }

    Ok(next.run(request).await)
}

// Extrator para obter a sessão diretamente nos handlers
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<SessionContext>().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "agente@inmobiliaria.mx".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_passes_guard() {
        let session = SessionContext::Authenticated { user: user(), role: AppRole::Admin };
        assert!(require_admin(&session).is_ok());
        assert!(session.is_admin());
    }

    #[test]
    fn test_non_admin_is_denied() {
        let session = SessionContext::Authenticated { user: user(), role: AppRole::User };
        assert!(matches!(require_admin(&session), Err(AppError::AccessDenied)));
    }

    #[test]
    fn test_missing_session_must_log_in() {
        assert!(matches!(require_admin(&SessionContext::Unauthenticated), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_unverified_session_is_not_sent_to_login() {
        let session = SessionContext::Loading;
        assert!(matches!(require_admin(&session), Err(AppError::SessionUnavailable)));
        assert!(session.authenticated().is_none());
        assert!(!session.is_admin());
    }
}
