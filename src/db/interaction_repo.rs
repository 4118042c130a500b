// src/db/interaction_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::interaction::{Interaction, NewInteraction},
};

// Sem pool próprio: toda operação roda na transação RLS da requisição.
#[derive(Clone, Default)]
pub struct InteractionRepository;

impl InteractionRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        interaction: &NewInteraction,
    ) -> Result<Interaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, Interaction>(
            r#"
            INSERT INTO interactions (id, lead_id, type, description, scheduled_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, lead_id, type, description, scheduled_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lead_id)
        .bind(interaction.interaction_type)
        .bind(&interaction.description)
        .bind(interaction.scheduled_at)
        .fetch_one(executor)
        .await?;

        Ok(created)
    }

    /// Mais novas primeiro. Interações de um lead excluído não aparecem
    /// (não há FK nem cascade).
    pub async fn list_for_lead<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<Vec<Interaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let interactions = sqlx::query_as::<_, Interaction>(
            r#"
            SELECT i.id, i.lead_id, i.type, i.description, i.scheduled_at, i.created_at
            FROM interactions i
            WHERE i.lead_id = $1
              AND EXISTS (SELECT 1 FROM leads l WHERE l.id = i.lead_id)
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(lead_id)
        .fetch_all(executor)
        .await?;

        Ok(interactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::db_utils::tests::admin_tx;
    use sqlx::PgPool;
    use crate::{
        db::LeadRepository,
        models::{
            interaction::InteractionType,
            lead::{LeadStatus, NewLead},
            property::PropertyType,
        },
    };

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer DATABASE_URL"]
    async fn test_interactions_of_deleted_lead_are_hidden(pool: PgPool) {
        let mut tx = admin_tx(&pool).await;
        let leads = LeadRepository::new();
        let repo = InteractionRepository::new();
        let lead_id = Uuid::new_v4();

        leads
            .insert(
                &mut *tx,
                lead_id,
                &NewLead {
                    name: "Beto".into(),
                    email: None,
                    phone: "6460000000".into(),
                    property_type: PropertyType::Oficina,
                    budget_min: None,
                    budget_max: None,
                    status: LeadStatus::Nuevo,
                    source: "llamada".into(),
                    notes: None,
                },
            )
            .await
            .unwrap();

        let call = NewInteraction {
            interaction_type: InteractionType::Llamada,
            description: Some("Primer contacto".into()),
            scheduled_at: None,
        };
        repo.insert(&mut *tx, lead_id, &call).await.unwrap();
        assert_eq!(repo.list_for_lead(&mut *tx, lead_id).await.unwrap().len(), 1);

        leads.delete(&mut *tx, lead_id).await.unwrap();
        assert!(repo.list_for_lead(&mut *tx, lead_id).await.unwrap().is_empty());
    }
}
