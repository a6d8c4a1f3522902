use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod connections;
pub mod designs;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod profiles;
pub mod settings;
pub mod uploads;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/orders", orders::router())
        .nest("/designs", designs::router())
        .nest("/profiles", profiles::router())
        .nest("/tailors", profiles::tailors_router())
        .nest("/connections", connections::router())
        .nest("/settings", settings::router())
        .nest("/admin", admin::router())
}

// Payment and upload endpoints keep their historical prefix.
pub fn create_legacy_router() -> Router<AppState> {
    Router::new()
        .merge(payments::router())
        .merge(uploads::router())
}
