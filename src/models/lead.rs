// src/models/lead.rs

use chrono::{DateTime, Utc};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{field_error, AppError},
        validation::{
            non_blank, to_money, validate_lead_source, validate_lead_status, validate_message, validate_name,
            validate_optional_email, validate_phone, validate_property_type,
        },
    },
    models::{interaction::InteractionView, property::{PropertySuggestion, PropertyType}},
};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Nuevo,
    Contactado,
    Calificado,
    Ganado,
    Perdido,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::Nuevo,
        LeadStatus::Contactado,
        LeadStatus::Calificado,
        LeadStatus::Ganado,
        LeadStatus::Perdido,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Nuevo => "nuevo",
            LeadStatus::Contactado => "contactado",
            LeadStatus::Calificado => "calificado",
            LeadStatus::Ganado => "ganado",
            LeadStatus::Perdido => "perdido",
        }
    }

    /// Ganado e perdido encerram o funil; o resto conta como lead ativo.
    pub fn is_closed(&self) -> bool {
        matches!(self, LeadStatus::Ganado | LeadStatus::Perdido)
    }
}

impl FromStr for LeadStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadStatus::ALL.into_iter().find(|st| st.as_str() == s).ok_or(())
    }
}

/// Canal de aquisição. No banco fica como texto livre.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    FormularioWeb,
    Llamada,
    Whatsapp,
    Referido,
    Facebook,
    Instagram,
    #[default]
    Otro,
}

impl LeadSource {
    pub const ALL: [LeadSource; 7] = [
        LeadSource::FormularioWeb,
        LeadSource::Llamada,
        LeadSource::Whatsapp,
        LeadSource::Referido,
        LeadSource::Facebook,
        LeadSource::Instagram,
        LeadSource::Otro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::FormularioWeb => "formulario_web",
            LeadSource::Llamada => "llamada",
            LeadSource::Whatsapp => "whatsapp",
            LeadSource::Referido => "referido",
            LeadSource::Facebook => "facebook",
            LeadSource::Instagram => "instagram",
            LeadSource::Otro => "otro",
        }
    }
}

impl FromStr for LeadSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadSource::ALL.into_iter().find(|src| src.as_str() == s).ok_or(())
    }
}

// --- LEAD (linha da tabela leads) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,

    #[schema(example = "Ana López")]
    pub name: String,
    pub email: Option<String>,
    #[schema(example = "6461112222")]
    pub phone: String,

    pub property_type: PropertyType,

    // Sem regra min <= max
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,

    pub status: LeadStatus,
    #[schema(example = "formulario_web")]
    pub source: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados de um lead novo (formulário público ou cadastro manual).
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub property_type: PropertyType,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub status: LeadStatus,
    pub source: String,
    pub notes: Option<String>,
}

// --- FORMULÁRIO PÚBLICO DE CONTATO ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormPayload {
    #[serde(default)]
    #[validate(custom(function = "validate_name"))]
    #[schema(example = "Ana López")]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "6461112222")]
    pub phone: String,

    #[validate(custom(function = "validate_optional_email"))]
    #[schema(example = "")]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_property_type"))]
    #[schema(example = "casa")]
    pub property_type: String,

    #[validate(custom(function = "validate_message"))]
    pub message: Option<String>,
}

impl ContactFormPayload {
    /// Lead do site: sempre "nuevo" e origem "formulario_web"; a mensagem vira as notas.
    pub fn into_new_lead(self) -> Result<NewLead, AppError> {
        let property_type = self
            .property_type
            .trim()
            .parse::<PropertyType>()
            .map_err(|_| field_error("property_type", "invalid_property_type"))?;

        Ok(NewLead {
            name: self.name.trim().to_string(),
            email: non_blank(self.email),
            phone: self.phone.trim().to_string(),
            property_type,
            budget_min: None,
            budget_max: None,
            status: LeadStatus::Nuevo,
            source: LeadSource::FormularioWeb.as_str().to_string(),
            notes: non_blank(self.message),
        })
    }
}

/// Resposta do formulário público (não expõe o registro inteiro).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub id: Uuid,
    pub status: LeadStatus,
    pub message: String,
}

// --- CADASTRO MANUAL (modal do admin) ---

/// Orçamento vindo do formulário: número JSON ou texto do input (vazio = nulo).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum BudgetInput {
    Number(f64),
    Text(String),
}

impl BudgetInput {
    pub fn to_decimal(&self) -> Result<Option<Decimal>, ()> {
        match self {
            BudgetInput::Number(n) => Decimal::from_f64(*n).map(Some).ok_or(()),
            BudgetInput::Text(s) if s.trim().is_empty() => Ok(None),
            BudgetInput::Text(s) => {
                let parsed: f64 = s.trim().parse().map_err(|_| ())?;
                if !parsed.is_finite() {
                    return Err(());
                }
                Decimal::from_f64(parsed).map(Some).ok_or(())
            }
        }
    }
}

fn validate_budget(budget: &BudgetInput) -> Result<(), ValidationError> {
    match budget.to_decimal() {
        Ok(Some(value)) => to_money(value).map(|_| ()),
        Ok(None) => Ok(()),
        Err(()) => {
            let mut err = ValidationError::new("invalid_number");
            err.message = Some("invalid_number".into());
            Err(err)
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[serde(default)]
    #[validate(custom(function = "validate_name"))]
    #[schema(example = "Juan Pérez")]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "646-123-4567")]
    pub phone: String,

    #[validate(custom(function = "validate_optional_email"))]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_property_type"))]
    #[schema(example = "casa")]
    pub property_type: String,

    #[serde(default)]
    #[validate(custom(function = "validate_lead_source"))]
    #[schema(example = "referido")]
    pub source: String,

    #[validate(custom(function = "validate_budget"))]
    #[schema(value_type = Option<f64>, example = 1000000)]
    pub budget_min: Option<BudgetInput>,

    #[validate(custom(function = "validate_budget"))]
    #[schema(value_type = Option<f64>, example = 5000000)]
    pub budget_max: Option<BudgetInput>,

    pub notes: Option<String>,
}

impl CreateLeadPayload {
    pub fn into_new_lead(self) -> Result<NewLead, AppError> {
        let property_type = self
            .property_type
            .trim()
            .parse::<PropertyType>()
            .map_err(|_| field_error("property_type", "invalid_property_type"))?;

        let source = match self.source.trim() {
            "" => LeadSource::default(),
            raw => raw
                .parse::<LeadSource>()
                .map_err(|_| field_error("source", "invalid_source"))?,
        };

        let budget = |input: Option<BudgetInput>, field: &'static str| -> Result<Option<Decimal>, AppError> {
            match input {
                Some(b) => match b.to_decimal().map_err(|_| field_error(field, "invalid_number"))? {
                    Some(value) => to_money(value)
                        .map(Some)
                        .map_err(|_| field_error(field, "amount_too_large")),
                    None => Ok(None),
                },
                None => Ok(None),
            }
        };

        Ok(NewLead {
            name: self.name.trim().to_string(),
            email: non_blank(self.email),
            phone: self.phone.trim().to_string(),
            property_type,
            budget_min: budget(self.budget_min, "budget_min")?,
            budget_max: budget(self.budget_max, "budget_max")?,
            status: LeadStatus::Nuevo,
            source: source.as_str().to_string(),
            notes: non_blank(self.notes),
        })
    }
}

// --- EDIÇÃO (status + notas) ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    #[serde(default)]
    #[validate(custom(function = "validate_lead_status"))]
    #[schema(example = "contactado")]
    pub status: String,

    pub notes: Option<String>,
}

// --- LISTAGEM E FILTROS ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeadListQuery {
    /// Status exato ou "all"
    pub status: Option<String>,
    /// Tipo de imóvel exato ou "all"
    pub property_type: Option<String>,
    /// Busca em nome, e-mail e telefone
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub property_type: Option<PropertyType>,
    pub search: Option<String>,
}

impl LeadListQuery {
    pub fn into_filter(self) -> Result<LeadFilter, AppError> {
        fn selection<T: FromStr>(raw: Option<String>, field: &'static str) -> Result<Option<T>, AppError> {
            match raw.as_deref().map(str::trim) {
                None | Some("") | Some("all") => Ok(None),
                Some(value) => value
                    .parse::<T>()
                    .map(Some)
                    .map_err(|_| field_error(field, "invalid_filter")),
            }
        }

        Ok(LeadFilter {
            status: selection(self.status, "status")?,
            property_type: selection(self.property_type, "property_type")?,
            search: non_blank(self.q).map(|q| q.to_lowercase()),
        })
    }
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        if self.status.is_some_and(|status| lead.status != status) {
            return false;
        }
        if self.property_type.is_some_and(|t| lead.property_type != t) {
            return false;
        }
        match &self.search {
            None => true,
            Some(query) => {
                lead.name.to_lowercase().contains(query)
                    || lead
                        .email
                        .as_deref()
                        .is_some_and(|email| email.to_lowercase().contains(query))
                    || lead.phone.to_lowercase().contains(query)
            }
        }
    }

    pub fn apply(&self, leads: &[Lead]) -> Vec<Lead> {
        leads.iter().filter(|lead| self.matches(lead)).cloned().collect()
    }
}

// --- DETALHE ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetail {
    pub lead: Lead,
    pub interactions: Vec<InteractionView>,
    pub suggested_properties: Vec<PropertySuggestion>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    pub(crate) fn sample_lead(name: &str, status: LeadStatus, property_type: PropertyType) -> Lead {
        let now = Utc::now();
        Lead {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: None,
            phone: "6461112222".to_string(),
            property_type,
            budget_min: None,
            budget_max: None,
            status,
            source: Some("otro".to_string()),
            notes: None,
            created_at: now - Duration::hours(1),
            updated_at: now,
        }
    }

    #[test]
    fn test_contact_form_scenario() {
        let payload: ContactFormPayload = serde_json::from_value(json!({
            "name": "Ana",
            "phone": "6461112222",
            "email": "",
            "propertyType": "casa",
            "message": ""
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        let lead = payload.into_new_lead().unwrap();

        assert_eq!(lead.status, LeadStatus::Nuevo);
        assert_eq!(lead.source, "formulario_web");
        assert_eq!(lead.email, None);
        assert_eq!(lead.notes, None);
        assert_eq!(lead.property_type, PropertyType::Casa);
    }

    #[test]
    fn test_contact_form_rejects_empty_name_or_phone() {
        for body in [
            json!({ "name": "", "phone": "6461112222", "propertyType": "casa" }),
            json!({ "name": "Ana", "phone": "", "propertyType": "casa" }),
            json!({ "phone": "6461112222", "propertyType": "casa" }),
        ] {
            let payload: ContactFormPayload = serde_json::from_value(body).unwrap();
            assert!(payload.validate().is_err());
        }
    }

    #[test]
    fn test_contact_form_rejects_bad_email_and_type() {
        let payload: ContactFormPayload = serde_json::from_value(json!({
            "name": "Ana",
            "phone": "6461112222",
            "email": "ana-en-dominio",
            "propertyType": ""
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("property_type"));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn test_manual_lead_budget_parsing() {
        let payload: CreateLeadPayload = serde_json::from_value(json!({
            "name": "Juan Pérez",
            "phone": "646-123-4567",
            "propertyType": "lote",
            "budgetMin": "",
            "budgetMax": "2500000.5"
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        let lead = payload.into_new_lead().unwrap();
        assert_eq!(lead.budget_min, None);
        assert_eq!(lead.budget_max, Some(Decimal::new(25000005, 1)));
        assert_eq!(lead.source, "otro");
        assert_eq!(lead.status, LeadStatus::Nuevo);
    }

    #[test]
    fn test_manual_lead_accepts_numeric_budget() {
        let payload: CreateLeadPayload = serde_json::from_value(json!({
            "name": "Juan",
            "phone": "6461234567",
            "propertyType": "casa",
            "source": "referido",
            "budgetMax": 5000000
        }))
        .unwrap();

        let lead = payload.into_new_lead().unwrap();
        assert_eq!(lead.budget_max, Some(Decimal::from(5_000_000)));
        assert_eq!(lead.source, "referido");
    }

    #[test]
    fn test_manual_lead_budget_must_fit_the_column() {
        let payload: CreateLeadPayload = serde_json::from_value(json!({
            "name": "Juan",
            "phone": "6461234567",
            "propertyType": "inversion",
            "budgetMin": "999999999999.99",
            "budgetMax": 1e12
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(!fields.contains_key("budget_min"));
        assert_eq!(fields["budget_max"][0].message.as_deref(), Some("amount_too_large"));

        let payload: CreateLeadPayload = serde_json::from_value(json!({
            "name": "Juan",
            "phone": "6461234567",
            "propertyType": "inversion",
            "budgetMax": "999999999999.99"
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(
            payload.into_new_lead().unwrap().budget_max,
            Some(Decimal::from_str("999999999999.99").unwrap())
        );
    }

    #[test]
    fn test_manual_lead_rejects_garbage_budget_and_source() {
        let payload: CreateLeadPayload = serde_json::from_value(json!({
            "name": "Juan",
            "phone": "6461234567",
            "propertyType": "casa",
            "source": "tiktok",
            "budgetMin": "mucho"
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("budget_min"));
        assert!(fields.contains_key("source"));
    }

    #[test]
    fn test_filter_by_status_and_type() {
        let leads = vec![
            sample_lead("Ana", LeadStatus::Nuevo, PropertyType::Casa),
            sample_lead("Beto", LeadStatus::Ganado, PropertyType::Casa),
            sample_lead("Carla", LeadStatus::Nuevo, PropertyType::Lote),
        ];

        let filter = LeadListQuery {
            status: Some("nuevo".into()),
            property_type: Some("casa".into()),
            q: None,
        }
        .into_filter()
        .unwrap();

        let found = filter.apply(&leads);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Ana");
    }

    #[test]
    fn test_filter_all_means_no_filter() {
        let leads = vec![
            sample_lead("Ana", LeadStatus::Nuevo, PropertyType::Casa),
            sample_lead("Beto", LeadStatus::Perdido, PropertyType::Oficina),
        ];
        let filter = LeadListQuery {
            status: Some("all".into()),
            property_type: Some("all".into()),
            q: Some("   ".into()),
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter, LeadFilter::default());
        assert_eq!(filter.apply(&leads).len(), 2);
    }

    #[test]
    fn test_search_is_case_insensitive_over_name_email_phone() {
        let mut with_email = sample_lead("Ana López", LeadStatus::Nuevo, PropertyType::Casa);
        with_email.email = Some("Ana@Correo.MX".into());
        let mut other = sample_lead("Beto", LeadStatus::Nuevo, PropertyType::Casa);
        other.phone = "5551234567".into();
        let leads = vec![with_email, other];

        let search = |q: &str| {
            LeadListQuery { q: Some(q.into()), ..Default::default() }
                .into_filter()
                .unwrap()
                .apply(&leads)
                .len()
        };

        assert_eq!(search("LÓPEZ"), 1);
        assert_eq!(search("correo.mx"), 1);
        assert_eq!(search("555123"), 1);
        assert_eq!(search("zzz"), 0);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let result = LeadListQuery { status: Some("dormido".into()), ..Default::default() }.into_filter();
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}
