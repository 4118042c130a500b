// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    middleware::auth::SessionContext,
    models::auth::{AppRole, AuthResponse, Claims, User},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    /// Cadastro aberto: o usuário nasce sem papel de admin.
    pub async fn register_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let hashed_password = hash_password(password).await?;

        let mut tx = self.user_repo.pool().begin().await?;
        let new_user = self.user_repo.create_user(&mut *tx, email, &hashed_password).await?;
        self.user_repo.grant_role(&mut *tx, new_user.id, AppRole::User).await?;
        tx.commit().await?;

        tracing::info!(user_id = %new_user.id, "Usuário registrado");

        Ok(AuthResponse {
            token: self.create_token(new_user.id)?,
            is_admin: false,
        })
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let role = self.role_of(&user).await?;
        Ok(AuthResponse {
            token: self.create_token(user.id)?,
            is_admin: role == AppRole::Admin,
        })
    }

    /// Token inválido, expirado ou de usuário removido vira sessão anônima;
    /// só falhas do banco sobem como erro.
    pub async fn resolve_session(&self, token: &str) -> Result<SessionContext, AppError> {
        let claims = match self.decode_claims(token) {
            Ok(claims) => claims,
            Err(_) => {
                tracing::debug!("Token rejeitado");
                return Ok(SessionContext::Unauthenticated);
            }
        };

        let Some(user) = self.user_repo.find_by_id(claims.sub).await? else {
            return Ok(SessionContext::Unauthenticated);
        };

        let role = self.role_of(&user).await?;
        Ok(SessionContext::Authenticated { user, role })
    }

    /// Garante o admin inicial definido no ambiente (cria ou promove).
    pub async fn ensure_bootstrap_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        let mut tx = self.user_repo.pool().begin().await?;

        let user = match self.user_repo.find_by_email(email).await? {
            Some(user) => user,
            None => {
                let hashed_password = hash_password(password).await?;
                self.user_repo.create_user(&mut *tx, email, &hashed_password).await?
            }
        };
        self.user_repo.grant_role(&mut *tx, user.id, AppRole::Admin).await?;
        tx.commit().await?;

        tracing::info!("👤 Admin inicial garantido: {}", email);
        Ok(())
    }

    async fn role_of(&self, user: &User) -> Result<AppRole, AppError> {
        let roles = self.user_repo.roles(user.id).await?;
        Ok(if roles.contains(&AppRole::Admin) {
            AppRole::Admin
        } else {
            AppRole::User
        })
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}
