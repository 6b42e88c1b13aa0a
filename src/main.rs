// src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::{
    config::{AppState, Config},
    docs::ApiDoc,
    middleware::auth::auth_guard,
    services::import_service::MAX_UPLOAD_BYTES,
};

// Folga para o envelope multipart em volta do arquivo
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar
    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let bind_addr = app_state.config.bind_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users))
        .route("/me", get(handlers::auth::get_me))
        .route("/me/permissions", get(handlers::rbac::my_permissions))
        .route("/{id}", patch(handlers::users::update_user));

    let lead_routes = Router::new()
        .route(
            "/",
            get(handlers::leads::list_leads).post(handlers::leads::create_lead),
        )
        .route(
            "/import",
            post(handlers::imports::import_leads)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD)),
        )
        .route(
            "/{id}",
            get(handlers::leads::get_lead)
                .put(handlers::leads::update_lead)
                .delete(handlers::leads::delete_lead),
        )
        .route("/{id}/stage", patch(handlers::leads::change_stage))
        .route("/{id}/assign", patch(handlers::leads::assign_lead))
        .route("/{id}/convert", post(handlers::leads::convert_lead))
        .route(
            "/{id}/interactions",
            get(handlers::leads::list_interactions).post(handlers::leads::add_interaction),
        );

    let calendar_routes = Router::new()
        .route(
            "/events",
            get(handlers::calendar::list_events).post(handlers::calendar::create_event),
        )
        .route(
            "/events/{id}",
            put(handlers::calendar::update_event)
                .delete(handlers::calendar::delete_event),
        )
        .route("/events/{id}/complete", patch(handlers::calendar::complete_event));

    let customer_routes = Router::new()
        .route(
            "/",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        );

    let target_routes = Router::new()
        .route(
            "/",
            get(handlers::targets::list_targets).post(handlers::targets::create_target),
        )
        .route("/{id}", delete(handlers::targets::delete_target))
        .route("/{id}/progress", get(handlers::targets::target_progress));

    let revenue_routes = Router::new()
        .route(
            "/",
            get(handlers::revenue::list_entries).post(handlers::revenue::create_entry),
        )
        .route(
            "/import",
            post(handlers::imports::import_revenue)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD)),
        )
        .route("/{id}", delete(handlers::revenue::delete_entry));

    let analytics_routes = Router::new()
        .route("/pipeline", get(handlers::analytics::pipeline))
        .route("/summary", get(handlers::analytics::summary))
        .route("/revenue-by-user", get(handlers::analytics::revenue_by_user));

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route("/unread-count", get(handlers::notifications::unread_count))
        .route("/stream", get(handlers::notifications::stream_notifications))
        .route("/read-all", post(handlers::notifications::mark_all_read))
        .route("/{id}/read", patch(handlers::notifications::mark_read));

    // Tudo abaixo exige Bearer token válido
    let protected_routes = Router::new()
        .route("/permissions", get(handlers::rbac::list_permissions))
        .nest("/users", user_routes)
        .nest("/leads", lead_routes)
        .nest("/calendar", calendar_routes)
        .nest("/customers", customer_routes)
        .nest("/targets", target_routes)
        .nest("/revenue", revenue_routes)
        .nest("/analytics", analytics_routes)
        .nest("/notifications", notification_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let cors = match app_state.config.cors_origin.clone() {
        Some(origin) => CorsLayer::new().allow_origin(origin),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // Pool preguiçoso: nenhuma conexão é aberta enquanto nenhuma query rodar
    fn test_app() -> Router {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/crm_test".to_string()),
            "JWT_SECRET" => Some("test-secret-with-at-least-32-chars!!".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();
        build_router(AppState::from_pool(config, pool).unwrap())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/leads", "/api/notifications/stream", "/api/users/me/permissions"] {
            let response = test_app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn unauthorized_message_follows_accept_language() {
        let response = test_app()
            .oneshot(
                Request::get("/api/customers")
                    .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let store = crate::common::i18n::I18nStore::load().unwrap();
        let body = body_json(response).await;
        assert_eq!(body["error"], store.translate("pt", "errors.invalid_token"));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_before_touching_the_database() {
        let response = test_app()
            .oneshot(
                Request::get("/api/leads")
                    .header(header::AUTHORIZATION, "Bearer nao-e-um-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_validates_before_hitting_the_database() {
        let response = test_app()
            .oneshot(
                Request::post("/api/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"x","password":"123","fullName":"A"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["details"]["email"].is_array());
        assert!(body["details"]["password"].is_array());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = test_app()
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"]["/api/leads/{id}/convert"].is_object());
    }
}
