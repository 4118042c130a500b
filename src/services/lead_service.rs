// src/services/lead_service.rs

use chrono::Utc;
use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{
        cache::{Entity, QueryCache, QueryKey},
        error::{field_error, AppError},
        validation::non_blank,
    },
    db::{InteractionRepository, LeadRepository, PropertyRepository},
    models::{
        interaction::{InteractionView, NewInteraction},
        lead::{Lead, LeadDetail, LeadFilter, LeadStatus, NewLead},
        property::{Property, PropertySuggestion},
    },
};

const MAX_SUGGESTIONS: usize = 5;

/// Único ponto de decisão sobre mudanças de status. Hoje qualquer status pode seguir qualquer outro.
pub fn ensure_status_transition(_from: LeadStatus, _to: LeadStatus) -> Result<(), AppError> {
    Ok(())
}

/// Até cinco imóveis ativos do tipo de interesse e dentro do orçamento máximo,
/// na ordem recebida (do mais novo para o mais antigo).
pub fn suggest_properties(lead: &Lead, properties: &[Property]) -> Vec<PropertySuggestion> {
    properties
        .iter()
        .filter(|p| p.fits_interest(lead.property_type, lead.budget_max))
        .take(MAX_SUGGESTIONS)
        .map(PropertySuggestion::from)
        .collect()
}

#[derive(Clone)]
pub struct LeadService {
    lead_repo: LeadRepository,
    interaction_repo: InteractionRepository,
    property_repo: PropertyRepository,
    cache: QueryCache,
}

impl LeadService {
    pub fn new(
        lead_repo: LeadRepository,
        interaction_repo: InteractionRepository,
        property_repo: PropertyRepository,
        cache: QueryCache,
    ) -> Self {
        Self {
            lead_repo,
            interaction_repo,
            property_repo,
            cache,
        }
    }

    // =========================================================================
    //  MUTAÇÕES: cada uma recebe a transação da requisição, faz o commit e
    //  só então invalida o cache
    // =========================================================================

    /// Formulário público. O id é gerado aqui porque o anônimo não pode ler a linha de volta.
    pub async fn submit_contact(&self, mut tx: Transaction<'static, Postgres>, lead: NewLead) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.lead_repo.insert(&mut *tx, id, &lead).await?;
        tx.commit().await?;

        self.cache.invalidate(Entity::Lead(id)).await;
        tracing::info!(lead_id = %id, "Novo lead pelo formulário de contato");
        Ok(id)
    }

    pub async fn create_manual(&self, mut tx: Transaction<'static, Postgres>, lead: NewLead) -> Result<Lead, AppError> {
        let id = Uuid::new_v4();
        self.lead_repo.insert(&mut *tx, id, &lead).await?;
        let created = self
            .lead_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::LeadNotFound(id))?;
        tx.commit().await?;

        self.cache.invalidate(Entity::Lead(id)).await;
        Ok(created)
    }

    /// Edição de status + notas (notas vazias viram NULL).
    pub async fn update(
        &self,
        mut tx: Transaction<'static, Postgres>,
        id: Uuid,
        status: &str,
        notes: Option<String>,
    ) -> Result<Lead, AppError> {
        let status = status
            .trim()
            .parse::<LeadStatus>()
            .map_err(|_| field_error("status", "invalid_status"))?;

        let current = self
            .lead_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::LeadNotFound(id))?;
        ensure_status_transition(current.status, status)?;

        let notes = non_blank(notes);
        let updated = self
            .lead_repo
            .update_status_and_notes(&mut *tx, id, status, notes.as_deref())
            .await?
            .ok_or(AppError::LeadNotFound(id))?;
        tx.commit().await?;

        self.cache.invalidate(Entity::Lead(id)).await;
        Ok(updated)
    }

    pub async fn delete(&self, mut tx: Transaction<'static, Postgres>, id: Uuid) -> Result<(), AppError> {
        if !self.lead_repo.delete(&mut *tx, id).await? {
            return Err(AppError::LeadNotFound(id));
        }
        tx.commit().await?;

        self.cache.invalidate(Entity::Lead(id)).await;
        tracing::info!(lead_id = %id, "Lead excluído");
        Ok(())
    }

    /// Registra uma interação. O lead em si não é alterado.
    pub async fn add_interaction(
        &self,
        mut tx: Transaction<'static, Postgres>,
        lead_id: Uuid,
        interaction: NewInteraction,
    ) -> Result<InteractionView, AppError> {
        if self.lead_repo.find_by_id(&mut *tx, lead_id).await?.is_none() {
            return Err(AppError::LeadNotFound(lead_id));
        }
        let created = self.interaction_repo.insert(&mut *tx, lead_id, &interaction).await?;
        tx.commit().await?;

        self.cache.invalidate(Entity::Interaction { lead_id }).await;
        Ok(InteractionView::from_interaction(created, Utc::now()))
    }

    // =========================================================================
    //  LEITURAS
    // =========================================================================

    pub async fn list(&self, conn: &mut PgConnection, filter: &LeadFilter) -> Result<Vec<Lead>, AppError> {
        let leads = self
            .cache
            .get_or_load(QueryKey::AllLeads, self.lead_repo.list_all(conn))
            .await?;
        Ok(filter.apply(&leads))
    }

    pub async fn detail(&self, conn: &mut PgConnection, id: Uuid) -> Result<LeadDetail, AppError> {
        let leads = self
            .cache
            .get_or_load(QueryKey::AllLeads, self.lead_repo.list_all(&mut *conn))
            .await?;
        let lead = leads
            .iter()
            .find(|lead| lead.id == id)
            .cloned()
            .ok_or(AppError::LeadNotFound(id))?;

        let interactions = self.list_interactions_of(&mut *conn, id).await?;

        let properties = self
            .cache
            .get_or_load(QueryKey::AllProperties, self.property_repo.list_all(&mut *conn))
            .await?;
        let suggested_properties = suggest_properties(&lead, &properties);

        Ok(LeadDetail {
            lead,
            interactions,
            suggested_properties,
        })
    }

    pub async fn list_interactions(&self, conn: &mut PgConnection, lead_id: Uuid) -> Result<Vec<InteractionView>, AppError> {
        if self.lead_repo.find_by_id(&mut *conn, lead_id).await?.is_none() {
            return Err(AppError::LeadNotFound(lead_id));
        }
        self.list_interactions_of(conn, lead_id).await
    }

    async fn list_interactions_of(&self, conn: &mut PgConnection, lead_id: Uuid) -> Result<Vec<InteractionView>, AppError> {
        let interactions = self
            .cache
            .get_or_load(
                QueryKey::LeadInteractions(lead_id),
                self.interaction_repo.list_for_lead(conn, lead_id),
            )
            .await?;

        let now = Utc::now();
        Ok(interactions
            .iter()
            .cloned()
            .map(|interaction| InteractionView::from_interaction(interaction, now))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        lead::tests::sample_lead,
        property::{tests::sample_property, PropertyStatus, PropertyType},
    };
    use rust_decimal::Decimal;

    #[test]
    fn test_suggestions_match_type_status_and_budget() {
        let mut lead = sample_lead("Ana", LeadStatus::Calificado, PropertyType::Casa);
        lead.budget_max = Some(Decimal::from(3_000_000));

        let properties = vec![
            sample_property(PropertyType::Casa, 2_000_000, PropertyStatus::Active),
            sample_property(PropertyType::Casa, 3_000_000, PropertyStatus::Active),
            sample_property(PropertyType::Casa, 3_000_001, PropertyStatus::Active),
            sample_property(PropertyType::Casa, 1_000_000, PropertyStatus::Sold),
            sample_property(PropertyType::Lote, 500_000, PropertyStatus::Active),
        ];

        let prices: Vec<_> = suggest_properties(&lead, &properties).iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![Decimal::from(2_000_000), Decimal::from(3_000_000)]);
    }

    #[test]
    fn test_suggestions_without_budget_are_capped_at_five() {
        let lead = sample_lead("Beto", LeadStatus::Nuevo, PropertyType::Oficina);
        let properties: Vec<_> = (1..=8)
            .map(|i| sample_property(PropertyType::Oficina, i * 10_000_000, PropertyStatus::Active))
            .collect();

        let suggestions = suggest_properties(&lead, &properties);
        assert_eq!(suggestions.len(), 5);
        assert_eq!(suggestions[0].id, properties[0].id);
    }

    #[test]
    fn test_every_transition_is_allowed() {
        for from in LeadStatus::ALL {
            for to in LeadStatus::ALL {
                assert!(ensure_status_transition(from, to).is_ok());
            }
        }
    }

    #[test]
    fn test_lost_lead_can_be_reopened() {
        assert!(ensure_status_transition(LeadStatus::Nuevo, LeadStatus::Perdido).is_ok());
        assert!(ensure_status_transition(LeadStatus::Perdido, LeadStatus::Nuevo).is_ok());
    }
}
