// src/common/formatting.rs

use rust_decimal::{Decimal, RoundingStrategy};

use crate::common::i18n::I18nStore;

/// Formata valores de dinheiro dos cards: "$1.3M" a partir de um milhão,
/// senão "$999,999" (sem casas decimais).
pub fn format_currency(value: Decimal) -> String {
    let million = Decimal::from(1_000_000);

    if value >= million {
        let millions = (value / million).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        return format!("${:.1}M", millions);
    }

    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = rounded.abs().trunc().to_string();

    format!("{}${}", sign, group_thousands(&digits))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// "nuevo" -> "Nuevo"
pub fn label_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Abreviação de três letras do mês (1..=12) no idioma pedido.
pub fn month_label(store: &I18nStore, lang: &str, month: u32) -> String {
    store.translate(lang, &format!("month.{}", month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millions_use_compact_form() {
        assert_eq!(format_currency(Decimal::from(1_250_000)), "$1.3M");
        assert_eq!(format_currency(Decimal::from(1_000_000)), "$1.0M");
        assert_eq!(format_currency(Decimal::from(12_340_000)), "$12.3M");
    }

    #[test]
    fn test_below_a_million_uses_grouped_integer() {
        assert_eq!(format_currency(Decimal::from(999_999)), "$999,999");
        assert_eq!(format_currency(Decimal::new(4_500_49, 2)), "$4,500");
        assert_eq!(format_currency(Decimal::ZERO), "$0");
        assert_eq!(format_currency(Decimal::from(950)), "$950");
    }

    #[test]
    fn test_label_case() {
        assert_eq!(label_case("calificado"), "Calificado");
        assert_eq!(label_case(""), "");
    }

    #[test]
    fn test_month_label() {
        let store = I18nStore::load().unwrap();
        assert_eq!(month_label(&store, "es", 12), "dic");
        assert_eq!(month_label(&store, "en", 5), "May");
    }
}
