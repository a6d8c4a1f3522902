use axum::{Json, Router, extract::State, routing::{get, put}};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    middleware::auth::AuthUser,
    models::AppSettings,
    response::ApiResponse,
    services::settings_service,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
    /// `before` or `after`.
    pub currency_position: Option<String>,
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub expected_version: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings))
        .route("/", put(update_settings))
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Application settings", body = ApiResponse<AppSettings>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<AppSettings>>> {
    Ok(Json(settings_service::get_settings(&state).await?))
}

#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<AppSettings>),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Version conflict")
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> AppResult<Json<ApiResponse<AppSettings>>> {
    Ok(Json(settings_service::update_settings(&state, &user, payload).await?))
}
