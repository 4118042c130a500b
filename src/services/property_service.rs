// src/services/property_service.rs

use chrono::Utc;
use sqlx::{PgConnection, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::{
        cache::{Entity, QueryCache, QueryKey},
        error::AppError,
    },
    db::PropertyRepository,
    models::property::{CatalogCategory, Property, PropertyCard, PropertyInput},
    services::storage::{object_name, validate_image, ImageStorage},
};

#[derive(Clone)]
pub struct PropertyService {
    repo: PropertyRepository,
    cache: QueryCache,
    storage: Arc<dyn ImageStorage>,
    placeholders: Arc<Vec<String>>,
}

impl PropertyService {
    pub fn new(
        repo: PropertyRepository,
        cache: QueryCache,
        storage: Arc<dyn ImageStorage>,
        placeholders: Vec<String>,
    ) -> Self {
        Self {
            repo,
            cache,
            storage,
            placeholders: Arc::new(placeholders),
        }
    }

    // =========================================================================
    //  CATÁLOGO PÚBLICO
    // =========================================================================

    pub async fn catalog(&self, conn: &mut PgConnection, category: CatalogCategory) -> Result<Vec<PropertyCard>, AppError> {
        let active = self
            .cache
            .get_or_load(QueryKey::ActiveProperties, self.repo.list_active(conn))
            .await?;

        let filtered: Vec<Property> = active.iter().filter(|p| category.includes(p)).cloned().collect();
        Ok(with_display_images(filtered, &self.placeholders))
    }

    // =========================================================================
    //  ADMIN
    // =========================================================================

    pub async fn list_all(&self, conn: &mut PgConnection) -> Result<Vec<Property>, AppError> {
        let properties = self
            .cache
            .get_or_load(QueryKey::AllProperties, self.repo.list_all(conn))
            .await?;
        Ok(properties.to_vec())
    }

    pub async fn get(&self, conn: &mut PgConnection, id: Uuid) -> Result<Property, AppError> {
        self.repo
            .find_by_id(conn, id)
            .await?
            .ok_or(AppError::PropertyNotFound(id))
    }

    pub async fn create(&self, mut tx: Transaction<'static, Postgres>, input: PropertyInput) -> Result<Property, AppError> {
        let property = self.repo.create(&mut *tx, &input).await?;
        tx.commit().await?;

        self.cache.invalidate(Entity::Property).await;
        tracing::info!(property_id = %property.id, "Propriedade criada");
        Ok(property)
    }

    pub async fn update(
        &self,
        mut tx: Transaction<'static, Postgres>,
        id: Uuid,
        input: PropertyInput,
    ) -> Result<Property, AppError> {
        let property = self
            .repo
            .update(&mut *tx, id, &input)
            .await?
            .ok_or(AppError::PropertyNotFound(id))?;
        tx.commit().await?;

        self.cache.invalidate(Entity::Property).await;
        Ok(property)
    }

    /// Exclusão definitiva. A imagem no storage fica onde está.
    pub async fn delete(&self, mut tx: Transaction<'static, Postgres>, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(&mut *tx, id).await? {
            return Err(AppError::PropertyNotFound(id));
        }
        tx.commit().await?;

        self.cache.invalidate(Entity::Property).await;
        tracing::info!(property_id = %id, "Propriedade excluída");
        Ok(())
    }

    /// Valida e envia a imagem; devolve a URL pública que o formulário grava no imóvel.
    pub async fn upload_image(
        &self,
        original_filename: Option<&str>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        if let Err(e) = validate_image(content_type, bytes.len()) {
            tracing::warn!("Upload rejeitado: {}", e);
            return Err(e);
        }

        let content_type = content_type.unwrap_or_default();
        let name = object_name(original_filename, content_type, Utc::now().timestamp_millis());
        self.storage.upload(&name, content_type, bytes).await
    }
}

/// Imóvel sem imagem recebe um placeholder pela posição na lista filtrada.
pub fn with_display_images(properties: Vec<Property>, placeholders: &[String]) -> Vec<PropertyCard> {
    properties
        .into_iter()
        .enumerate()
        .map(|(position, property)| {
            let display_image = match &property.image_url {
                Some(url) => url.clone(),
                None if placeholders.is_empty() => String::new(),
                None => placeholders[position % placeholders.len()].clone(),
            };
            PropertyCard { property, display_image }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::property::{tests::sample_property, PropertyStatus, PropertyType},
        services::storage::{LocalDiskStorage, MAX_IMAGE_BYTES},
    };

    fn placeholders() -> Vec<String> {
        (1..=4).map(|i| format!("/assets/property-{}.jpg", i)).collect()
    }

    #[test]
    fn test_placeholders_rotate_by_position() {
        let mut properties: Vec<_> = (0..6)
            .map(|i| sample_property(PropertyType::Casa, 1_000_000 + i, PropertyStatus::Active))
            .collect();
        properties[1].image_url = Some("https://cdn.example/foto.jpg".into());

        let cards = with_display_images(properties, &placeholders());
        let images: Vec<_> = cards.iter().map(|c| c.display_image.as_str()).collect();

        assert_eq!(
            images,
            vec![
                "/assets/property-1.jpg",
                "https://cdn.example/foto.jpg",
                "/assets/property-3.jpg",
                "/assets/property-4.jpg",
                "/assets/property-1.jpg",
                "/assets/property-2.jpg",
            ]
        );
    }

    #[test]
    fn test_category_filter_before_rotation() {
        let properties = vec![
            sample_property(PropertyType::Lote, 1, PropertyStatus::Active),
            sample_property(PropertyType::Casa, 2, PropertyStatus::Active),
            sample_property(PropertyType::Casa, 3, PropertyStatus::Active),
        ];
        let category = CatalogCategory::parse(Some("casa")).unwrap();
        let filtered: Vec<_> = properties.into_iter().filter(|p| category.includes(p)).collect();

        let cards = with_display_images(filtered, &placeholders());
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].display_image, "/assets/property-1.jpg");
        assert_eq!(cards[1].display_image, "/assets/property-2.jpg");
    }

    #[tokio::test]
    async fn test_upload_rejects_before_touching_storage() {
        let dir = tempfile::tempdir().unwrap();
        let service = PropertyService::new(
            PropertyRepository::new(),
            QueryCache::new(true),
            Arc::new(LocalDiskStorage::new(dir.path(), "http://localhost:3000/storage/property-images")),
            placeholders(),
        );

        let too_big = service
            .upload_image(Some("grande.jpg"), Some("image/jpeg"), vec![0; MAX_IMAGE_BYTES + 1])
            .await;
        assert!(matches!(too_big, Err(AppError::ImageTooLarge(_))));

        let not_image = service.upload_image(Some("doc.pdf"), Some("application/pdf"), vec![1]).await;
        assert!(matches!(not_image, Err(AppError::InvalidImageType(_))));

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let url = service.upload_image(Some("fachada.png"), Some("image/png"), vec![1, 2]).await.unwrap();
        assert!(url.starts_with("http://localhost:3000/storage/property-images/"));
        assert!(url.ends_with(".png"));
    }
}
