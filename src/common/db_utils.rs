// src/common/db_utils.rs

use sqlx::{Postgres, Transaction};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::SessionContext;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Abre a transação da requisição e define as variáveis lidas pelas policies.
/// `set_config(..., true)` vale só dentro desta transação.
pub(crate) async fn begin_rls_transaction(
    app_state: &AppState,
    session: &SessionContext,
) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = app_state.db_pool.begin().await?;

    let (user_id, role) = match session.authenticated() {
        Some((user, role)) => (user.id.to_string(), role.as_str()),
        None => (String::new(), "anon"),
    };

    sqlx::query("SELECT set_config('app.user_id', $1, true), set_config('app.role', $2, true)")
        .bind(user_id)
        .bind(role)
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
