// src/db/property_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::property::{Property, PropertyInput},
};

const PROPERTY_COLUMNS: &str = r#"
    id, title, type, category, location, price, currency, beds, baths, area,
    description, featured, status, image_url, created_at, updated_at
"#;

// Sem pool próprio: toda operação roda na transação RLS da requisição.
#[derive(Clone, Default)]
pub struct PropertyRepository;

impl PropertyRepository {
    pub fn new() -> Self {
        Self
    }

    /// Listagem do admin: todos os status, mais novos primeiro.
    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<Property>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM properties ORDER BY created_at DESC", PROPERTY_COLUMNS);
        Ok(sqlx::query_as::<_, Property>(&sql).fetch_all(executor).await?)
    }

    /// Catálogo público: só ativos, destaques primeiro e depois os mais novos.
    pub async fn list_active<'e, E>(&self, executor: E) -> Result<Vec<Property>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM properties WHERE status = 'active' ORDER BY featured DESC, created_at DESC",
            PROPERTY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Property>(&sql).fetch_all(executor).await?)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Property>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM properties WHERE id = $1", PROPERTY_COLUMNS);
        Ok(sqlx::query_as::<_, Property>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?)
    }

    pub async fn create<'e, E>(&self, executor: E, input: &PropertyInput) -> Result<Property, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO properties (
                id, title, type, category, location, price, currency,
                beds, baths, area, description, featured, status, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            PROPERTY_COLUMNS
        );

        let property = sqlx::query_as::<_, Property>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(input.property_type)
            .bind(&input.category)
            .bind(&input.location)
            .bind(input.price)
            .bind(input.currency)
            .bind(input.beds)
            .bind(input.baths)
            .bind(&input.area)
            .bind(&input.description)
            .bind(input.featured)
            .bind(input.status)
            .bind(&input.image_url)
            .fetch_one(executor)
            .await?;

        Ok(property)
    }

    /// Atualização de todos os campos do formulário (a imagem removida vira NULL).
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &PropertyInput,
    ) -> Result<Option<Property>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE properties SET
                title = $2, type = $3, category = $4, location = $5, price = $6,
                currency = $7, beds = $8, baths = $9, area = $10, description = $11,
                featured = $12, status = $13, image_url = $14, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROPERTY_COLUMNS
        );

        let property = sqlx::query_as::<_, Property>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(input.property_type)
            .bind(&input.category)
            .bind(&input.location)
            .bind(input.price)
            .bind(input.currency)
            .bind(input.beds)
            .bind(input.baths)
            .bind(&input.area)
            .bind(&input.description)
            .bind(input.featured)
            .bind(input.status)
            .bind(&input.image_url)
            .fetch_optional(executor)
            .await?;

        Ok(property)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::db_utils::tests::admin_tx;
    use crate::models::property::{Currency, PropertyStatus, PropertyType};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn input(title: &str, featured: bool, status: PropertyStatus) -> PropertyInput {
        PropertyInput {
            title: title.to_string(),
            property_type: PropertyType::Casa,
            category: "casa".to_string(),
            location: "Ensenada".to_string(),
            price: Decimal::from(2_500_000),
            currency: Currency::Mxn,
            beds: Some(3),
            baths: Some(2),
            area: "200 m²".to_string(),
            description: None,
            featured,
            status,
            image_url: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer DATABASE_URL"]
    async fn test_catalog_lists_only_active_featured_first(pool: PgPool) {
        let mut tx = admin_tx(&pool).await;
        let repo = PropertyRepository::new();
        repo.create(&mut *tx, &input("Normal", false, PropertyStatus::Active)).await.unwrap();
        repo.create(&mut *tx, &input("Destacada", true, PropertyStatus::Active)).await.unwrap();
        repo.create(&mut *tx, &input("Vendida", true, PropertyStatus::Sold)).await.unwrap();

        let active = repo.list_active(&mut *tx).await.unwrap();
        let titles: Vec<_> = active.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Destacada", "Normal"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer DATABASE_URL"]
    async fn test_update_clears_image(pool: PgPool) {
        let mut tx = admin_tx(&pool).await;
        let repo = PropertyRepository::new();
        let mut data = input("Con foto", false, PropertyStatus::Active);
        data.image_url = Some("http://localhost:3000/storage/property-images/a.jpg".into());
        let created = repo.create(&mut *tx, &data).await.unwrap();

        data.image_url = None;
        let updated = repo.update(&mut *tx, created.id, &data).await.unwrap().unwrap();
        assert_eq!(updated.image_url, None);
        assert!(updated.updated_at >= created.updated_at);
    }
}
