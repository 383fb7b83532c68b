//! HTTP surface over the catalog.
//!
//! ```text
//! /api/contents[/{id}]             public, active content only
//! /api/categories, /api/age-groups public lists
//! /api/admin/...                   admin CRUD + reorder, needs x-admin-principal
//! ```

pub mod auth;
pub mod error;
pub mod handlers;
pub mod params;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::store::Catalog;

pub use error::{AppError, AppResult};

/// Build the full application router
pub fn router(catalog: Catalog) -> Router {
    let public = Router::new()
        .route("/contents", get(handlers::public_list_contents))
        .route("/contents/{id}", get(handlers::public_get_content))
        .route("/categories", get(handlers::public_list_categories))
        .route("/age-groups", get(handlers::public_list_age_groups));

    let admin = Router::new()
        .route(
            "/contents",
            get(handlers::admin_list_contents).post(handlers::create_content),
        )
        .route("/contents/reorder", put(handlers::reorder_contents))
        .route(
            "/contents/{id}",
            get(handlers::admin_get_content)
                .patch(handlers::update_content)
                .delete(handlers::delete_content),
        )
        .route(
            "/categories",
            get(handlers::admin_list_categories).post(handlers::create_category),
        )
        .route("/categories/reorder", put(handlers::reorder_categories))
        .route(
            "/categories/{id}",
            get(handlers::admin_get_category)
                .patch(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/age-groups",
            get(handlers::admin_list_age_groups).post(handlers::create_age_group),
        )
        .route("/age-groups/reorder", put(handlers::reorder_age_groups))
        .route(
            "/age-groups/{id}",
            get(handlers::admin_get_age_group)
                .patch(handlers::update_age_group)
                .delete(handlers::delete_age_group),
        )
        .route(
            "/settings",
            get(handlers::admin_list_settings).post(handlers::create_setting),
        )
        .route(
            "/settings/{id}",
            get(handlers::admin_get_setting)
                .patch(handlers::update_setting)
                .delete(handlers::delete_setting),
        )
        .route_layer(middleware::from_fn(auth::require_admin));

    Router::new()
        .nest("/api/admin", admin)
        .nest("/api", public)
        .layer(TraceLayer::new_for_http())
        .with_state(catalog)
}

/// Bind `address` and serve until the process is stopped
pub async fn serve(catalog: Catalog, address: &str) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(address = %listener.local_addr()?, "Serving catalog API");
    axum::serve(listener, router(catalog))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
