// src/services/report_service.rs

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgConnection;

use crate::{
    common::{
        cache::{QueryCache, QueryKey},
        error::AppError,
        formatting::{format_currency, label_case, month_label},
        i18n::I18nStore,
    },
    db::{LeadRepository, PropertyRepository},
    models::{
        dashboard::{LeadKpis, MonthlyLeads, PropertyStats, ReportsOverview, StatusSlice, TypeInterest},
        lead::{Lead, LeadStatus},
        property::{Property, PropertyType},
    },
};

const MONTHS_IN_SERIES: u32 = 6;
const FALLBACK_COLOR: &str = "#94a3b8";

#[derive(Clone)]
pub struct ReportService {
    lead_repo: LeadRepository,
    property_repo: PropertyRepository,
    cache: QueryCache,
}

impl ReportService {
    pub fn new(lead_repo: LeadRepository, property_repo: PropertyRepository, cache: QueryCache) -> Self {
        Self { lead_repo, property_repo, cache }
    }

    pub async fn dashboard(&self, conn: &mut PgConnection) -> Result<PropertyStats, AppError> {
        let properties = self
            .cache
            .get_or_load(QueryKey::AllProperties, self.property_repo.list_all(conn))
            .await?;
        Ok(build_property_stats(&properties))
    }

    pub async fn reports(
        &self,
        conn: &mut PgConnection,
        lang: &str,
        store: &I18nStore,
    ) -> Result<ReportsOverview, AppError> {
        let leads = self
            .cache
            .get_or_load(QueryKey::AllLeads, self.lead_repo.list_all(conn))
            .await?;
        Ok(build_report(&leads, Utc::now(), lang, store))
    }
}

// ---
// Agregações (funções puras)
// ---

/// Partição exata por tipo: a soma dos tipos é sempre o total.
pub fn build_property_stats(properties: &[Property]) -> PropertyStats {
    let mut stats = PropertyStats {
        total: properties.len(),
        ..Default::default()
    };
    for property in properties {
        match property.property_type {
            PropertyType::Casa => stats.casas += 1,
            PropertyType::Oficina => stats.oficinas += 1,
            PropertyType::Lote => stats.lotes += 1,
            PropertyType::Inversion => stats.inversiones += 1,
        }
    }
    stats
}

pub fn build_report(leads: &[Lead], now: DateTime<Utc>, lang: &str, store: &I18nStore) -> ReportsOverview {
    // Distribuições seguem a ordem da primeira aparição, do lead mais antigo ao mais novo
    let mut chronological: Vec<&Lead> = leads.iter().collect();
    chronological.sort_by_key(|lead| lead.created_at);

    let monthly = monthly_series(&chronological, now, lang, store);
    let leads_this_month = monthly.last().map(|m| m.count).unwrap_or_default();

    ReportsOverview {
        kpis: lead_kpis(&chronological, leads_this_month),
        monthly,
        by_status: status_distribution(&chronological),
        by_property_type: type_interest(&chronological),
    }
}

fn lead_kpis(leads: &[&Lead], leads_this_month: usize) -> LeadKpis {
    let total_leads = leads.len();
    let active_leads = leads.iter().filter(|l| !l.status.is_closed()).count();
    let won_leads = leads.iter().filter(|l| l.status == LeadStatus::Ganado).count();

    let conversion_rate = (total_leads > 0).then(|| {
        (Decimal::from(won_leads * 100) / Decimal::from(total_leads))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    });
    let conversion_label = match conversion_rate {
        Some(rate) => format!("{:.1}%", rate),
        None => "0%".to_string(),
    };

    let potential_value: Decimal = leads
        .iter()
        .filter(|l| !l.status.is_closed())
        .filter_map(|l| l.budget_max)
        .sum();

    LeadKpis {
        total_leads,
        active_leads,
        won_leads,
        leads_this_month,
        conversion_rate,
        conversion_label,
        potential_value,
        potential_value_label: format_currency(potential_value),
    }
}

// Os seis meses civis (UTC) que terminam no mês corrente, do mais antigo ao atual
fn monthly_series(leads: &[&Lead], now: DateTime<Utc>, lang: &str, store: &I18nStore) -> Vec<MonthlyLeads> {
    (0..MONTHS_IN_SERIES)
        .rev()
        .map(|back| {
            let (year, month) = months_before(now.year(), now.month(), back);
            let count = leads
                .iter()
                .filter(|l| l.created_at.year() == year && l.created_at.month() == month)
                .count();
            MonthlyLeads {
                year,
                month,
                label: month_label(store, lang, month),
                count,
            }
        })
        .collect()
}

fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn status_color(status: &str) -> &'static str {
    match status {
        "nuevo" => "#3b82f6",
        "contactado" => "#eab308",
        "calificado" => "#a855f7",
        "ganado" => "#22c55e",
        "perdido" => "#ef4444",
        _ => FALLBACK_COLOR,
    }
}

// Contagem preservando a ordem da primeira aparição
fn count_in_order<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
}

fn status_distribution(leads: &[&Lead]) -> Vec<StatusSlice> {
    count_in_order(leads.iter().map(|l| l.status.as_str()))
        .into_iter()
        .map(|(status, count)| StatusSlice {
            status: status.to_string(),
            label: label_case(status),
            count,
            color: status_color(status),
        })
        .collect()
}

fn type_interest(leads: &[&Lead]) -> Vec<TypeInterest> {
    count_in_order(leads.iter().map(|l| l.property_type.as_str()))
        .into_iter()
        .map(|(property_type, count)| TypeInterest {
            property_type: property_type.to_string(),
            label: label_case(property_type),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        lead::tests::sample_lead,
        property::{tests::sample_property, PropertyStatus},
    };
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn lead(status: LeadStatus, property_type: PropertyType, created_at: DateTime<Utc>, budget_max: Option<i64>) -> Lead {
        let mut lead = sample_lead("Lead", status, property_type);
        lead.created_at = created_at;
        lead.budget_max = budget_max.map(Decimal::from);
        lead
    }

    #[test]
    fn test_empty_report() {
        let store = I18nStore::load().unwrap();
        let report = build_report(&[], at(2025, 6, 10, 12), "es", &store);

        assert_eq!(report.kpis.total_leads, 0);
        assert_eq!(report.kpis.conversion_rate, None);
        assert_eq!(report.kpis.conversion_label, "0%");
        assert_eq!(report.kpis.potential_value, Decimal::ZERO);
        assert_eq!(report.kpis.potential_value_label, "$0");
        assert_eq!(report.monthly.len(), 6);
        assert!(report.monthly.iter().all(|m| m.count == 0));
        assert!(report.by_status.is_empty());
    }

    #[test]
    fn test_conversion_rate_one_decimal() {
        let store = I18nStore::load().unwrap();
        let now = at(2025, 6, 10, 12);
        let leads = vec![
            lead(LeadStatus::Ganado, PropertyType::Casa, at(2025, 6, 1, 9), None),
            lead(LeadStatus::Nuevo, PropertyType::Casa, at(2025, 6, 2, 9), None),
        ];
        assert_eq!(build_report(&leads, now, "es", &store).kpis.conversion_label, "50.0%");

        let thirds = vec![
            lead(LeadStatus::Ganado, PropertyType::Casa, at(2025, 6, 1, 9), None),
            lead(LeadStatus::Nuevo, PropertyType::Casa, at(2025, 6, 2, 9), None),
            lead(LeadStatus::Perdido, PropertyType::Casa, at(2025, 6, 3, 9), None),
        ];
        let kpis = build_report(&thirds, now, "es", &store).kpis;
        assert_eq!(kpis.conversion_label, "33.3%");
        assert_eq!(kpis.active_leads, 1);
        assert_eq!(kpis.won_leads, 1);
    }

    #[test]
    fn test_potential_value_counts_only_open_leads_with_budget() {
        let store = I18nStore::load().unwrap();
        let now = at(2025, 6, 10, 12);
        let leads = vec![
            lead(LeadStatus::Nuevo, PropertyType::Casa, at(2025, 5, 1, 9), Some(1_000_000)),
            lead(LeadStatus::Calificado, PropertyType::Lote, at(2025, 5, 2, 9), Some(500_000)),
            lead(LeadStatus::Contactado, PropertyType::Lote, at(2025, 5, 3, 9), None),
            lead(LeadStatus::Ganado, PropertyType::Casa, at(2025, 5, 4, 9), Some(9_000_000)),
            lead(LeadStatus::Perdido, PropertyType::Casa, at(2025, 5, 5, 9), Some(7_000_000)),
        ];

        let kpis = build_report(&leads, now, "es", &store).kpis;
        assert_eq!(kpis.potential_value, Decimal::from(1_500_000));
        assert_eq!(kpis.potential_value_label, "$1.5M");
    }

    #[test]
    fn test_monthly_series_crosses_year_boundary() {
        let store = I18nStore::load().unwrap();
        let now = at(2025, 2, 15, 12);
        let leads = vec![
            lead(LeadStatus::Nuevo, PropertyType::Casa, at(2024, 8, 31, 23), None),
            lead(LeadStatus::Nuevo, PropertyType::Casa, at(2024, 9, 1, 0), None),
            lead(LeadStatus::Nuevo, PropertyType::Casa, at(2024, 12, 31, 23), None),
            lead(LeadStatus::Nuevo, PropertyType::Casa, at(2025, 2, 1, 0), None),
            lead(LeadStatus::Nuevo, PropertyType::Casa, at(2025, 2, 14, 8), None),
        ];

        let report = build_report(&leads, now, "es", &store);
        let labels: Vec<_> = report.monthly.iter().map(|m| m.label.as_str()).collect();
        let counts: Vec<_> = report.monthly.iter().map(|m| m.count).collect();

        assert_eq!(labels, vec!["sep", "oct", "nov", "dic", "ene", "feb"]);
        assert_eq!(counts, vec![1, 0, 0, 1, 0, 2]);
        assert_eq!(report.monthly[0].year, 2024);
        assert_eq!(report.kpis.leads_this_month, 2);
    }

    #[test]
    fn test_distributions_keep_first_appearance_order() {
        let store = I18nStore::load().unwrap();
        let now = at(2025, 6, 10, 12);
        // Fora de ordem de propósito: a ordenação usa created_at
        let leads = vec![
            lead(LeadStatus::Ganado, PropertyType::Oficina, at(2025, 6, 3, 9), None),
            lead(LeadStatus::Contactado, PropertyType::Casa, at(2025, 6, 1, 9), None),
            lead(LeadStatus::Contactado, PropertyType::Oficina, at(2025, 6, 2, 9), None),
        ];

        let report = build_report(&leads, now, "en", &store);

        let statuses: Vec<_> = report
            .by_status
            .iter()
            .map(|s| (s.label.as_str(), s.count, s.color))
            .collect();
        assert_eq!(statuses, vec![("Contactado", 2, "#eab308"), ("Ganado", 1, "#22c55e")]);

        let types: Vec<_> = report.by_property_type.iter().map(|t| (t.label.as_str(), t.count)).collect();
        assert_eq!(types, vec![("Casa", 1), ("Oficina", 2)]);
        assert_eq!(report.monthly.last().unwrap().label, "Jun");
    }

    #[test]
    fn test_unknown_status_uses_fallback_color() {
        assert_eq!(status_color("archivado"), FALLBACK_COLOR);
    }

    #[test]
    fn test_property_stats_partition() {
        let properties = vec![
            sample_property(PropertyType::Casa, 1, PropertyStatus::Active),
            sample_property(PropertyType::Casa, 2, PropertyStatus::Sold),
            sample_property(PropertyType::Lote, 3, PropertyStatus::Inactive),
            sample_property(PropertyType::Inversion, 4, PropertyStatus::Active),
        ];

        let stats = build_property_stats(&properties);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.casas, 2);
        assert_eq!(stats.oficinas, 0);
        assert_eq!(stats.casas + stats.oficinas + stats.lotes + stats.inversiones, stats.total);
    }
}
