// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

// --- DASHBOARD (contagem de imóveis) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyStats {
    pub total: usize,
    pub casas: usize,
    pub oficinas: usize,
    pub lotes: usize,
    pub inversiones: usize,
}

// --- RELATÓRIOS ---

// Cards do topo
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadKpis {
    pub total_leads: usize,
    pub active_leads: usize,
    pub won_leads: usize,
    pub leads_this_month: usize,
    /// Taxa com uma casa decimal; None quando não há leads
    pub conversion_rate: Option<Decimal>,
    #[schema(example = "50.0%")]
    pub conversion_label: String,
    pub potential_value: Decimal,
    #[schema(example = "$4.5M")]
    pub potential_value_label: String,
}

// Gráfico de barras: leads por mês
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyLeads {
    pub year: i32,
    pub month: u32,
    #[schema(example = "mar")]
    pub label: String,
    pub count: usize,
}

// Gráfico de pizza: distribuição por status
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusSlice {
    #[schema(example = "nuevo")]
    pub status: String,
    #[schema(example = "Nuevo")]
    pub label: String,
    pub count: usize,
    #[schema(value_type = String, example = "#3b82f6")]
    pub color: &'static str,
}

// Interesse por tipo de imóvel
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeInterest {
    #[schema(example = "casa")]
    pub property_type: String,
    #[schema(example = "Casa")]
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportsOverview {
    pub kpis: LeadKpis,
    pub monthly: Vec<MonthlyLeads>,
    pub by_status: Vec<StatusSlice>,
    pub by_property_type: Vec<TypeInterest>,
}
