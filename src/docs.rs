// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::{common, handlers, models};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::update_user,

        // --- RBAC ---
        handlers::rbac::my_permissions,
        handlers::rbac::list_permissions,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::create_lead,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,
        handlers::leads::change_stage,
        handlers::leads::assign_lead,
        handlers::leads::convert_lead,
        handlers::leads::list_interactions,
        handlers::leads::add_interaction,

        // --- Calendar ---
        handlers::calendar::list_events,
        handlers::calendar::create_event,
        handlers::calendar::update_event,
        handlers::calendar::complete_event,
        handlers::calendar::delete_event,

        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::create_customer,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,

        // --- Targets ---
        handlers::targets::list_targets,
        handlers::targets::create_target,
        handlers::targets::delete_target,
        handlers::targets::target_progress,

        // --- Revenue ---
        handlers::revenue::list_entries,
        handlers::revenue::create_entry,
        handlers::revenue::delete_entry,

        // --- Analytics ---
        handlers::analytics::pipeline,
        handlers::analytics::summary,
        handlers::analytics::revenue_by_user,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::unread_count,
        handlers::notifications::stream_notifications,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,

        // --- Import ---
        handlers::imports::import_leads,
        handlers::imports::import_revenue,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::UpdateUserPayload,

            // --- RBAC ---
            models::rbac::Permission,
            models::rbac::MyPermissionsResponse,
            models::rbac::RolePermissions,

            // --- Leads ---
            models::lead::LeadStage,
            models::lead::LeadSource,
            models::lead::Lead,
            models::lead::CreateLeadPayload,
            models::lead::UpdateLeadPayload,
            models::lead::ChangeStagePayload,
            models::lead::AssignLeadPayload,

            // --- Interactions / Calendar ---
            common::calendar::CalendarView,
            models::interaction::InteractionKind,
            models::interaction::Interaction,
            models::interaction::CalendarEvent,
            models::interaction::CreateInteractionPayload,
            models::interaction::CreateEventPayload,
            models::interaction::UpdateEventPayload,

            // --- Customers ---
            models::customer::Customer,
            models::customer::CreateCustomerPayload,
            models::customer::UpdateCustomerPayload,

            // --- Targets ---
            models::target::Target,
            models::target::CreateTargetPayload,
            models::target::TargetProgress,

            // --- Revenue ---
            models::revenue::DailyRevenue,
            models::revenue::CreateRevenuePayload,

            // --- Analytics ---
            models::analytics::StageSummary,
            models::analytics::AnalyticsSummary,
            models::analytics::UserRevenue,

            // --- Notifications ---
            models::notification::NotificationKind,
            models::notification::Notification,
            models::notification::UnreadCountResponse,
            models::notification::MarkAllReadResponse,

            // --- Import ---
            models::import::ImportReport,
            models::import::RowError,
            models::import::CsvUpload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Usuários, papéis e equipes"),
        (name = "RBAC", description = "Controle de Acesso (Papéis e Permissões)"),
        (name = "Leads", description = "Funil de vendas e histórico de interações"),
        (name = "Calendar", description = "Agenda de ligações, reuniões e tarefas"),
        (name = "Customers", description = "Clientes convertidos"),
        (name = "Targets", description = "Metas por usuário e período"),
        (name = "Revenue", description = "Lançamentos diários de receita"),
        (name = "Analytics", description = "Indicadores do funil e de receita"),
        (name = "Notifications", description = "Notificações (consulta e push via SSE)"),
        (name = "Import", description = "Importação em massa via CSV")
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
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
