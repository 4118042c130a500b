// src/common/validation.rs

// Validações customizadas compartilhadas pelos payloads.
// As mensagens são códigos; a tradução acontece em AppError::to_api_error.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use validator::{ValidateEmail, ValidationError};

use crate::models::{
    interaction::InteractionType,
    lead::{LeadSource, LeadStatus},
    property::PropertyType,
};

fn coded(code: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(code.into());
    err
}

fn check_text(value: &str, max_chars: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(coded("required"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(coded("too_long"));
    }
    Ok(())
}

pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    check_text(value, 100)
}

pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    check_text(value, 20)
}

pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    check_text(value, usize::MAX)
}

pub fn validate_message(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > 1000 {
        return Err(coded("too_long"));
    }
    Ok(())
}

/// E-mail vazio é aceito (campo opcional); preenchido precisa ser local@dominio.
pub fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    if trimmed.chars().count() > 255 {
        return Err(coded("too_long"));
    }
    if !trimmed.validate_email() {
        return Err(coded("invalid_email"));
    }
    Ok(())
}

pub fn validate_property_type(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(coded("required"));
    }
    value
        .trim()
        .parse::<PropertyType>()
        .map(|_| ())
        .map_err(|_| coded("invalid_property_type"))
}

pub fn validate_lead_status(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(coded("required"));
    }
    value
        .trim()
        .parse::<LeadStatus>()
        .map(|_| ())
        .map_err(|_| coded("invalid_status"))
}

pub fn validate_lead_source(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    value
        .trim()
        .parse::<LeadSource>()
        .map(|_| ())
        .map_err(|_| coded("invalid_source"))
}

pub fn validate_interaction_type(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(coded("required"));
    }
    value
        .trim()
        .parse::<InteractionType>()
        .map(|_| ())
        .map_err(|_| coded("invalid_interaction_type"))
}

pub fn validate_schedule(value: &str) -> Result<(), ValidationError> {
    match parse_schedule(value) {
        Ok(_) => Ok(()),
        Err(()) => Err(coded("invalid_date")),
    }
}

/// Aceita RFC 3339 ou o formato do input datetime-local ("2025-03-01T10:30"), lido como UTC.
/// Texto vazio vira None.
pub fn parse_schedule(value: &str) -> Result<Option<DateTime<Utc>>, ()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Some(naive.and_utc()));
        }
    }
    Err(())
}

/// Valores das colunas NUMERIC(14, 2): duas casas (arredondamento igual ao do Postgres)
/// e valor absoluto menor que 10^12.
pub fn to_money(value: Decimal) -> Result<Decimal, ValidationError> {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.abs() >= Decimal::from(1_000_000_000_000_i64) {
        return Err(coded("amount_too_large"));
    }
    Ok(rounded)
}

/// Texto opcional: vazio (ou só espaços) é tratado como ausente.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
