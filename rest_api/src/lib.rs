// rest_api/src/lib.rs
//
// JSON API for the triage dashboard: cookie sessions with CSRF protection,
// CRUD controllers over the triage records, the specialist call actions and
// the dashboard summary.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::future::Future;

use anyhow::Context;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use handlers::{auth, catalog, clinical, dashboard, emergencies, notifications, users};

pub use error::{ApiResult, RestApiError};
pub use state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(security::csrf::XSRF_HEADER),
            HeaderName::from_static(security::csrf::CSRF_HEADER),
            HeaderName::from_static("x-requested-with"),
        ])
}

/// Builds the application router with all routes and layers.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/user", get(auth::current_user))
        .route("/profile", axum::routing::patch(auth::update_profile).put(auth::update_profile))
        .route("/users", get(users::list_users).post(users::create_user))
        // Catalogs
        .route("/patients", get(catalog::list_patients).post(catalog::create_patient))
        .route(
            "/patients/:id",
            get(catalog::show_patient)
                .patch(catalog::update_patient)
                .put(catalog::update_patient)
                .delete(catalog::delete_patient),
        )
        .route("/departments", get(catalog::list_departments).post(catalog::create_department))
        .route(
            "/departments/:id",
            get(catalog::show_department)
                .patch(catalog::update_department)
                .put(catalog::update_department)
                .delete(catalog::delete_department),
        )
        .route("/investigations", get(catalog::list_investigations).post(catalog::create_investigation))
        .route(
            "/investigations/:id",
            get(catalog::show_investigation)
                .patch(catalog::update_investigation)
                .put(catalog::update_investigation)
                .delete(catalog::delete_investigation),
        )
        .route(
            "/specialist-investigations",
            get(catalog::list_specialist_investigations).post(catalog::create_specialist_investigation),
        )
        .route(
            "/specialist-investigations/:id",
            get(catalog::show_specialist_investigation)
                .patch(catalog::update_specialist_investigation)
                .put(catalog::update_specialist_investigation)
                .delete(catalog::delete_specialist_investigation),
        )
        // Emergencies
        .route("/emergencies", get(emergencies::list_emergencies).post(emergencies::create_emergency))
        .route(
            "/emergencies/:id",
            get(emergencies::show_emergency)
                .patch(emergencies::update_emergency)
                .put(emergencies::update_emergency)
                .delete(emergencies::delete_emergency),
        )
        .route("/emergencies/:id/arrive", post(emergencies::arrive))
        .route("/emergencies/:id/close", post(emergencies::close))
        .route("/emergencies/:id/call-specialist", post(emergencies::call_specialist))
        .route("/emergencies/:id/remind-specialist", post(emergencies::remind_specialist))
        // Clinical work
        .route(
            "/investigations-performed",
            get(clinical::list_performed).post(clinical::create_performed),
        )
        .route(
            "/investigations-performed/:id",
            get(clinical::show_performed)
                .patch(clinical::update_performed)
                .put(clinical::update_performed)
                .delete(clinical::delete_performed),
        )
        .route("/specialist-visits", get(clinical::list_visits).post(clinical::create_visit))
        .route(
            "/specialist-visits/:id",
            get(clinical::show_visit)
                .patch(clinical::update_visit)
                .put(clinical::update_visit)
                .delete(clinical::delete_visit),
        )
        .route(
            "/specialist-investigation-requests",
            get(clinical::list_requests).post(clinical::create_request),
        )
        .route(
            "/specialist-investigation-requests/:id",
            get(clinical::show_request)
                .patch(clinical::update_request)
                .put(clinical::update_request)
                .delete(clinical::delete_request),
        )
        .route("/attachments", get(clinical::list_attachments).post(clinical::create_attachment))
        .route(
            "/attachments/:id",
            get(clinical::show_attachment)
                .patch(clinical::update_attachment)
                .put(clinical::update_attachment)
                .delete(clinical::delete_attachment),
        )
        // Notifications and overview
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route("/dashboard", get(dashboard::summary))
        .route("/triage-suggest", post(dashboard::triage_suggest));

    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(handlers::health_check_handler))
        .route("/sanctum/csrf-cookie", get(auth::csrf_cookie))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(middleware::csrf_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serves the API until `shutdown` resolves.
pub async fn start_server<F>(state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.server.bind_address();
    let app = create_router(state.clone());

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;
    tracing::info!("REST API server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("REST API server failed to start or run")?;

    state.store.flush().await.context("Failed to flush the database on shutdown")?;
    tracing::info!("REST API server stopped.");
    Ok(())
}
