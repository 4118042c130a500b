// src/db/lead_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lead::{Lead, LeadStatus, NewLead},
};

const LEAD_COLUMNS: &str = r#"
    id, name, email, phone, property_type, budget_min, budget_max,
    status, source, notes, created_at, updated_at
"#;

// Sem pool próprio: toda operação roda na transação RLS da requisição.
#[derive(Clone, Default)]
pub struct LeadRepository;

impl LeadRepository {
    pub fn new() -> Self {
        Self
    }

    /// Insere sem RETURNING: o visitante anônimo pode inserir mas não ler leads.
    pub async fn insert<'e, E>(&self, executor: E, id: Uuid, lead: &NewLead) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO leads (
                id, name, email, phone, property_type,
                budget_min, budget_max, status, source, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(lead.property_type)
        .bind(lead.budget_min)
        .bind(lead.budget_max)
        .bind(lead.status)
        .bind(&lead.source)
        .bind(&lead.notes)
        .execute(executor)
        .await?;

        Ok(())
    }

    // Mais novos primeiro
    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM leads ORDER BY created_at DESC", LEAD_COLUMNS);
        let leads = sqlx::query_as::<_, Lead>(&sql).fetch_all(executor).await?;
        Ok(leads)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM leads WHERE id = $1", LEAD_COLUMNS);
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(lead)
    }

    /// Status e notas vão juntos num único UPDATE.
    pub async fn update_status_and_notes<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: LeadStatus,
        notes: Option<&str>,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE leads
            SET status = $2, notes = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LEAD_COLUMNS
        );
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(status)
            .bind(notes)
            .fetch_optional(executor)
            .await?;
        Ok(lead)
    }

    /// Exclusão definitiva. Retorna false se o lead não existia.
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
