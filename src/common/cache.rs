// src/common/cache.rs

use std::{collections::HashMap, future::Future, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{interaction::Interaction, lead::Lead, property::Property},
};

// ---
// Chaves das consultas em cache
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    AllLeads,
    LeadInteractions(Uuid),
    AllProperties,
    ActiveProperties,
}

/// Entidade alterada por uma mutação já confirmada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Lead(Uuid),
    Interaction { lead_id: Uuid },
    Property,
}

impl Entity {
    /// Consultas que deixam de valer quando esta entidade muda.
    pub fn dependent_keys(&self) -> Vec<QueryKey> {
        match *self {
            Entity::Lead(id) => vec![QueryKey::AllLeads, QueryKey::LeadInteractions(id)],
            Entity::Interaction { lead_id } => {
                vec![QueryKey::LeadInteractions(lead_id), QueryKey::AllLeads]
            }
            Entity::Property => vec![QueryKey::AllProperties, QueryKey::ActiveProperties],
        }
    }
}

#[derive(Debug, Clone)]
pub enum Cached {
    Leads(Arc<Vec<Lead>>),
    Interactions(Arc<Vec<Interaction>>),
    Properties(Arc<Vec<Property>>),
}

/// Liga um tipo de linha à variante de `Cached` que o guarda.
pub trait CacheEntry: Sized {
    fn wrap(rows: Arc<Vec<Self>>) -> Cached;
    fn unwrap(cached: &Cached) -> Option<Arc<Vec<Self>>>;
}

impl CacheEntry for Lead {
    fn wrap(rows: Arc<Vec<Self>>) -> Cached {
        Cached::Leads(rows)
    }
    fn unwrap(cached: &Cached) -> Option<Arc<Vec<Self>>> {
        match cached {
            Cached::Leads(rows) => Some(rows.clone()),
            _ => None,
        }
    }
}

impl CacheEntry for Interaction {
    fn wrap(rows: Arc<Vec<Self>>) -> Cached {
        Cached::Interactions(rows)
    }
    fn unwrap(cached: &Cached) -> Option<Arc<Vec<Self>>> {
        match cached {
            Cached::Interactions(rows) => Some(rows.clone()),
            _ => None,
        }
    }
}

impl CacheEntry for Property {
    fn wrap(rows: Arc<Vec<Self>>) -> Cached {
        Cached::Properties(rows)
    }
    fn unwrap(cached: &Cached) -> Option<Arc<Vec<Self>>> {
        match cached {
            Cached::Properties(rows) => Some(rows.clone()),
            _ => None,
        }
    }
}

#[derive(Default)]
struct CacheState {
    // Incrementa a cada invalidação; leitura iniciada antes dela não grava no cache
    generation: u64,
    entries: HashMap<QueryKey, Cached>,
}

#[derive(Clone)]
pub struct QueryCache {
    enabled: bool,
    state: Arc<RwLock<CacheState>>,
}

impl QueryCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    /// Devolve o resultado em cache ou aguarda `load` e guarda o resultado.
    /// `load` só é executado em caso de miss.
    pub async fn get_or_load<T, E, Fut>(&self, key: QueryKey, load: Fut) -> Result<Arc<Vec<T>>, AppError>
    where
        T: CacheEntry,
        Fut: Future<Output = Result<Vec<T>, E>>,
        AppError: From<E>,
    {
        if !self.enabled {
            return Ok(Arc::new(load.await?));
        }

        let generation = {
            let state = self.state.read().await;
            if let Some(hit) = state.entries.get(&key).and_then(T::unwrap) {
                return Ok(hit);
            }
            state.generation
        };

        let rows = Arc::new(load.await?);

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.entries.insert(key, T::wrap(rows.clone()));
        }
        Ok(rows)
    }

    /// Chamado depois do commit da mutação.
    pub async fn invalidate(&self, entity: Entity) {
        if !self.enabled {
            return;
        }
        let mut state = self.state.write().await;
        state.generation += 1;
        for key in entity.dependent_keys() {
            state.entries.remove(&key);
        }
        tracing::debug!(?entity, "Cache invalidado");
    }

    #[cfg(test)]
    async fn contains(&self, key: QueryKey) -> bool {
        self.state.read().await.entries.contains_key(&key)
    }
}
