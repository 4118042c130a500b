// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_session,

        // --- Público ---
        handlers::contact::submit_contact,
        handlers::properties::list_catalog,

        // --- Dashboard ---
        handlers::dashboard::get_dashboard,
        handlers::dashboard::get_reports,

        // --- Propriedades ---
        handlers::properties::list_properties,
        handlers::properties::get_property,
        handlers::properties::create_property,
        handlers::properties::update_property,
        handlers::properties::delete_property,
        handlers::properties::upload_property_image,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::create_lead,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,
        handlers::leads::list_interactions,
        handlers::leads::create_interaction,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::AppRole,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::SessionView,

            // --- Propriedades ---
            models::property::PropertyType,
            models::property::PropertyStatus,
            models::property::Currency,
            models::property::Property,
            models::property::PropertyCard,
            models::property::PropertySuggestion,
            models::property::PropertyPayload,
            handlers::properties::ImageUploadResponse,
            handlers::properties::ImageUploadForm,

            // --- Leads ---
            models::lead::LeadStatus,
            models::lead::LeadSource,
            models::lead::Lead,
            models::lead::LeadDetail,
            models::lead::ContactFormPayload,
            models::lead::ContactReceipt,
            models::lead::CreateLeadPayload,
            models::lead::UpdateLeadPayload,

            // --- Interações ---
            models::interaction::InteractionType,
            models::interaction::Interaction,
            models::interaction::InteractionView,
            models::interaction::CreateInteractionPayload,

            // --- Dashboard ---
            models::dashboard::PropertyStats,
            models::dashboard::LeadKpis,
            models::dashboard::MonthlyLeads,
            models::dashboard::StatusSlice,
            models::dashboard::TypeInterest,
            models::dashboard::ReportsOverview,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Sessão"),
        (name = "Público", description = "Catálogo e Formulário de Contato"),
        (name = "Leads", description = "Gestão de Prospectos e Interações"),
        (name = "Propriedades", description = "Cadastro de Imóveis e Imagens"),
        (name = "Dashboard", description = "Indicadores e Relatórios")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
