// src/common/i18n.rs

use anyhow::Context;
use std::{collections::HashMap, sync::Arc};

/// Idioma usado quando o cliente não manda Accept-Language ou pede um que não temos.
pub const DEFAULT_LANG: &str = "es";

const CATALOGS: [(&str, &str); 2] = [
    ("es", include_str!("../../locales/es.json")),
    ("en", include_str!("../../locales/en.json")),
];

// Catálogos de mensagens carregados uma vez na inicialização
#[derive(Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();

        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Catálogo de mensagens '{}' inválido", lang))?;
            catalogs.insert(lang.to_string(), messages);
        }

        Ok(Self {
            catalogs: Arc::new(catalogs),
        })
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.catalogs.contains_key(lang)
    }

    /// Busca a chave no idioma pedido, depois no padrão; se nada existir devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        let lang = if self.supports(lang) { lang } else { DEFAULT_LANG };
        self.catalogs
            .get(lang)
            .and_then(|messages| messages.get(key))
            .or_else(|| {
                self.catalogs
                    .get(DEFAULT_LANG)
                    .and_then(|messages| messages.get(key))
            })
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
