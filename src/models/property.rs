// src/models/property.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::{
    error::{field_error, AppError},
    validation::{non_blank, to_money, validate_property_type, validate_required},
};

// --- ENUMS ---

// Compartilhado entre imóveis e o interesse dos leads
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "property_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Casa,
    Oficina,
    Lote,
    Inversion,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::Casa,
        PropertyType::Oficina,
        PropertyType::Lote,
        PropertyType::Inversion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Casa => "casa",
            PropertyType::Oficina => "oficina",
            PropertyType::Lote => "lote",
            PropertyType::Inversion => "inversion",
        }
    }
}

impl FromStr for PropertyType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "property_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    #[default]
    Active,
    Inactive,
    Sold,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "currency_code", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Mxn,
    Usd,
}

// --- IMÓVEL (linha da tabela properties) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,

    #[schema(example = "Villa Oceánica Premium")]
    pub title: String,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub property_type: PropertyType,

    // Texto livre; quando vazio no formulário recebe o próprio tipo
    pub category: String,

    #[schema(example = "Ensenada, Baja California")]
    pub location: String,

    #[schema(example = 8500000)]
    pub price: Decimal,
    pub currency: Currency,

    pub beds: Option<i32>,
    pub baths: Option<i32>,

    // Não é numérico: "350 m²", "2,500 m²"
    #[schema(example = "350 m²")]
    pub area: String,

    pub description: Option<String>,
    pub featured: bool,
    pub status: PropertyStatus,
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// Regra das sugestões do detalhe do lead: mesmo tipo, ativo e dentro do orçamento (se houver).
    /// Orçamento zero conta como não informado.
    pub fn fits_interest(&self, property_type: PropertyType, budget_max: Option<Decimal>) -> bool {
        self.property_type == property_type
            && self.status == PropertyStatus::Active
            && budget_max
                .filter(|max| !max.is_zero())
                .is_none_or(|max| self.price <= max)
    }
}

/// Item do catálogo público: imóvel + imagem a exibir (a própria ou um placeholder).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCard {
    #[serde(flatten)]
    pub property: Property,
    pub display_image: String,
}

/// Resumo exibido nas sugestões do lead.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertySuggestion {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub price: Decimal,
    pub currency: Currency,
    pub location: String,
    pub image_url: Option<String>,
}

impl From<&Property> for PropertySuggestion {
    fn from(p: &Property) -> Self {
        Self {
            id: p.id,
            title: p.title.clone(),
            property_type: p.property_type,
            price: p.price,
            currency: p.currency,
            location: p.location.clone(),
            image_url: p.image_url.clone(),
        }
    }
}

/// Filtro de categoria do catálogo: "all" ou um tipo exato.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogCategory {
    All,
    Only(PropertyType),
}

impl CatalogCategory {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Ok(CatalogCategory::All),
            Some(value) => value
                .parse::<PropertyType>()
                .map(CatalogCategory::Only)
                .map_err(|_| field_error("category", "invalid_filter")),
        }
    }

    pub fn includes(&self, property: &Property) -> bool {
        match self {
            CatalogCategory::All => true,
            CatalogCategory::Only(t) => property.property_type == *t,
        }
    }
}

// --- FORMULÁRIO (criar / editar) ---

fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("must_be_positive".into());
        return Err(err);
    }
    to_money(*price).map(|_| ())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPayload {
    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    #[schema(example = "Villa Oceánica Premium")]
    pub title: String,

    #[serde(rename = "type", default)]
    #[validate(custom(function = "validate_property_type"))]
    #[schema(example = "casa")]
    pub property_type: String,

    pub category: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    #[schema(example = "Ensenada, Baja California")]
    pub location: String,

    #[validate(required(message = "required"), custom(function = "validate_positive_price"))]
    #[schema(example = 8500000)]
    pub price: Option<Decimal>,

    #[serde(default)]
    pub currency: Currency,

    #[validate(range(min = 0, message = "not_negative"))]
    pub beds: Option<i32>,

    #[validate(range(min = 0, message = "not_negative"))]
    pub baths: Option<i32>,

    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    #[schema(example = "350 m²")]
    pub area: String,

    pub description: Option<String>,

    #[serde(default)]
    pub featured: bool,

    #[serde(default)]
    pub status: PropertyStatus,

    // URL devolvida pelo upload; vazio/ausente remove a imagem (o arquivo no bucket fica)
    pub image_url: Option<String>,
}

/// Dados já validados, prontos para INSERT/UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInput {
    pub title: String,
    pub property_type: PropertyType,
    pub category: String,
    pub location: String,
    pub price: Decimal,
    pub currency: Currency,
    pub beds: Option<i32>,
    pub baths: Option<i32>,
    pub area: String,
    pub description: Option<String>,
    pub featured: bool,
    pub status: PropertyStatus,
    pub image_url: Option<String>,
}

impl PropertyPayload {
    pub fn into_input(self) -> Result<PropertyInput, AppError> {
        let property_type = self
            .property_type
            .trim()
            .parse::<PropertyType>()
            .map_err(|_| field_error("property_type", "invalid_property_type"))?;
        let price = self.price.ok_or_else(|| field_error("price", "required"))?;
        let price = to_money(price).map_err(|_| field_error("price", "amount_too_large"))?;

        Ok(PropertyInput {
            title: self.title.trim().to_string(),
            property_type,
            category: non_blank(self.category).unwrap_or_else(|| property_type.as_str().to_string()),
            location: self.location.trim().to_string(),
            price,
            currency: self.currency,
            beds: self.beds,
            baths: self.baths,
            area: self.area.trim().to_string(),
            description: non_blank(self.description),
            featured: self.featured,
            status: self.status,
            image_url: non_blank(self.image_url),
        })
    }
}
