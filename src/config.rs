// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    common::{cache::QueryCache, i18n::I18nStore},
    db::{InteractionRepository, LeadRepository, PropertyRepository, UserRepository},
    services::{
        auth::AuthService,
        lead_service::LeadService,
        property_service::PropertyService,
        report_service::ReportService,
        storage::LocalDiskStorage,
    },
};

// --- CONFIGURAÇÃO (variáveis de ambiente) ---

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub storage_dir: String,
    pub public_storage_url: String,
    pub placeholder_images: Vec<String>,
    pub query_cache_enabled: bool,
    pub bootstrap_admin: Option<(String, String)>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Lê as chaves por uma função de consulta (o ambiente, em produção).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: '{}'", raw))?,
            None => 5,
        };

        let query_cache_enabled = match get("QUERY_CACHE_ENABLED") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("QUERY_CACHE_ENABLED deve ser true ou false: '{}'", raw))?,
            None => true,
        };

        let placeholder_images = match get("PLACEHOLDER_IMAGES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => (1..=4).map(|i| format!("/assets/property-{}.jpg", i)).collect(),
        };

        let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_EMAIL"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            (None, None) => None,
            _ => anyhow::bail!("BOOTSTRAP_ADMIN_EMAIL e BOOTSTRAP_ADMIN_PASSWORD devem ser definidos juntos"),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            storage_dir: get("STORAGE_DIR").unwrap_or_else(|| "./storage/property-images".to_string()),
            public_storage_url: get("PUBLIC_STORAGE_URL")
                .unwrap_or_else(|| "http://localhost:3000/storage/property-images".to_string()),
            placeholder_images,
            query_cache_enabled,
            bootstrap_admin,
        })
    }
}

// --- ESTADO COMPARTILHADO ---

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub lead_service: LeadService,
    pub property_service: PropertyService,
    pub report_service: ReportService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Settings::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::build(settings, db_pool)
    }

    // --- Monta o gráfico de dependências ---
    pub fn build(settings: Settings, db_pool: PgPool) -> anyhow::Result<Self> {
        let i18n_store = I18nStore::load()?;
        let cache = QueryCache::new(settings.query_cache_enabled);

        let storage = Arc::new(LocalDiskStorage::new(
            settings.storage_dir.clone(),
            settings.public_storage_url.clone(),
        ));

        let auth_service = AuthService::new(UserRepository::new(db_pool.clone()), settings.jwt_secret.clone());
        let lead_service = LeadService::new(
            LeadRepository::new(),
            InteractionRepository::new(),
            PropertyRepository::new(),
            cache.clone(),
        );
        let property_service = PropertyService::new(
            PropertyRepository::new(),
            cache.clone(),
            storage,
            settings.placeholder_images.clone(),
        );
        let report_service = ReportService::new(LeadRepository::new(), PropertyRepository::new(), cache);

        Ok(Self {
            db_pool,
            settings: Arc::new(settings),
            i18n_store,
            auth_service,
            lead_service,
            property_service,
            report_service,
        })
    }
}
