// src/models/interaction.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::{
    error::{field_error, AppError},
    validation::{non_blank, parse_schedule, validate_interaction_type, validate_schedule},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "interaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Llamada,
    Email,
    Whatsapp,
    Reunion,
    Visita,
    Nota,
}

impl InteractionType {
    pub const ALL: [InteractionType; 6] = [
        InteractionType::Llamada,
        InteractionType::Email,
        InteractionType::Whatsapp,
        InteractionType::Reunion,
        InteractionType::Visita,
        InteractionType::Nota,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Llamada => "llamada",
            InteractionType::Email => "email",
            InteractionType::Whatsapp => "whatsapp",
            InteractionType::Reunion => "reunion",
            InteractionType::Visita => "visita",
            InteractionType::Nota => "nota",
        }
    }
}

impl FromStr for InteractionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InteractionType::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}

// Registro imutável: não há update nem delete de interações.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: Uuid,
    pub lead_id: Uuid,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,

    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at.is_some_and(|at| at > now)
    }
}

/// Interação como aparece no detalhe do lead, com a marca de "próxima".
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InteractionView {
    #[serde(flatten)]
    pub interaction: Interaction,
    pub is_upcoming: bool,
}

impl InteractionView {
    pub fn from_interaction(interaction: Interaction, now: DateTime<Utc>) -> Self {
        let is_upcoming = interaction.is_upcoming(now);
        Self { interaction, is_upcoming }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInteractionPayload {
    #[serde(default, rename = "type")]
    #[validate(custom(function = "validate_interaction_type"))]
    #[schema(example = "llamada")]
    pub interaction_type: String,

    pub description: Option<String>,

    /// RFC 3339 ou "YYYY-MM-DDTHH:MM" (UTC)
    #[validate(custom(function = "validate_schedule"))]
    #[schema(example = "2025-03-01T10:30")]
    pub scheduled_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInteraction {
    pub interaction_type: InteractionType,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl CreateInteractionPayload {
    pub fn into_new_interaction(self) -> Result<NewInteraction, AppError> {
        let interaction_type = self
            .interaction_type
            .trim()
            .parse::<InteractionType>()
            .map_err(|_| field_error("interaction_type", "invalid_interaction_type"))?;

        let scheduled_at = match self.scheduled_at.as_deref() {
            Some(raw) => parse_schedule(raw).map_err(|_| field_error("scheduled_at", "invalid_date"))?,
            None => None,
        };

        Ok(NewInteraction {
            interaction_type,
            description: non_blank(self.description),
            scheduled_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn interaction(scheduled_at: Option<DateTime<Utc>>) -> Interaction {
        Interaction {
            id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            interaction_type: InteractionType::Visita,
            description: None,
            scheduled_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_upcoming_only_when_scheduled_in_future() {
        let now = Utc::now();
        assert!(interaction(Some(now + Duration::hours(2))).is_upcoming(now));
        assert!(!interaction(Some(now - Duration::hours(2))).is_upcoming(now));
        assert!(!interaction(None).is_upcoming(now));
    }

    #[test]
    fn test_payload_parses_datetime_local_as_utc() {
        let payload: CreateInteractionPayload = serde_json::from_value(json!({
            "type": "reunion",
            "description": "  ",
            "scheduledAt": "2025-03-01T10:30"
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        let new = payload.into_new_interaction().unwrap();
        assert_eq!(new.interaction_type, InteractionType::Reunion);
        assert_eq!(new.description, None);
        assert_eq!(new.scheduled_at, Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap()));
    }

    #[test]
    fn test_payload_requires_type() {
        let payload: CreateInteractionPayload =
            serde_json::from_value(json!({ "description": "sin tipo" })).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("interaction_type"));
    }

    #[test]
    fn test_blank_schedule_is_null() {
        let payload: CreateInteractionPayload =
            serde_json::from_value(json!({ "type": "nota", "scheduledAt": "" })).unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.into_new_interaction().unwrap().scheduled_at, None);
    }

    #[test]
    fn test_view_serializes_type_and_flag() {
        let now = Utc::now();
        let view = InteractionView::from_interaction(interaction(Some(now + Duration::days(1))), now);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["type"], "visita");
        assert_eq!(value["isUpcoming"], true);
        assert!(value.get("leadId").is_some());
    }
}
