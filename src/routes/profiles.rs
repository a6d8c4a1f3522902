use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, put},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::auth::AuthUser,
    models::{BusinessHours, ClientProfile, Measurements, TailorProfile},
    response::ApiResponse,
    routes::params::Pagination,
    services::profile_service,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClientProfileRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub preferred_styles: Vec<String>,
    pub measurements: Option<Measurements>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TailorProfileRequest {
    pub business_name: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub years_of_experience: i32,
    pub profile_picture_url: Option<String>,
    /// `free`, `basic` or `premium`; defaults to `free`.
    pub license_type: Option<String>,
    #[schema(value_type = Object)]
    pub business_hours: Option<BusinessHours>,
}

#[derive(Serialize, ToSchema)]
pub struct TailorProfileList {
    pub items: Vec<TailorProfile>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/client/{user_id}", get(get_client_profile))
        .route("/client", put(upsert_client_profile))
        .route("/client/measurements", patch(update_measurements))
        .route("/tailor/{user_id}", get(get_tailor_profile))
        .route("/tailor", put(upsert_tailor_profile))
}

#[utoipa::path(
    get,
    path = "/api/profiles/client/{user_id}",
    params(("user_id" = Uuid, Path, description = "Client user id")),
    responses(
        (status = 200, description = "Client profile", body = ApiResponse<ClientProfile>),
        (status = 403, description = "No relationship with this client"),
        (status = 404, description = "No profile yet")
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn get_client_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ClientProfile>>> {
    Ok(Json(profile_service::get_client_profile(&state.pool, &user, user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/profiles/client",
    request_body = ClientProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = ApiResponse<ClientProfile>),
        (status = 403, description = "Client only")
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn upsert_client_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ClientProfileRequest>,
) -> AppResult<Json<ApiResponse<ClientProfile>>> {
    Ok(Json(profile_service::upsert_client_profile(&state.pool, &user, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/profiles/client/measurements",
    request_body = Measurements,
    responses(
        (status = 200, description = "Measurements merged", body = ApiResponse<ClientProfile>),
        (status = 403, description = "Client only")
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn update_measurements(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<Measurements>,
) -> AppResult<Json<ApiResponse<ClientProfile>>> {
    Ok(Json(profile_service::update_measurements(&state.pool, &user, update).await?))
}

#[utoipa::path(
    get,
    path = "/api/profiles/tailor/{user_id}",
    params(("user_id" = Uuid, Path, description = "Tailor user id")),
    responses(
        (status = 200, description = "Tailor profile", body = ApiResponse<TailorProfile>),
        (status = 404, description = "No profile yet")
    ),
    tag = "profiles"
)]
pub async fn get_tailor_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TailorProfile>>> {
    Ok(Json(profile_service::get_tailor_profile(&state.pool, user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/profiles/tailor",
    request_body = TailorProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = ApiResponse<TailorProfile>),
        (status = 403, description = "Tailor only")
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn upsert_tailor_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TailorProfileRequest>,
) -> AppResult<Json<ApiResponse<TailorProfile>>> {
    Ok(Json(profile_service::upsert_tailor_profile(&state.pool, &user, payload).await?))
}

/// Public directory router, mounted separately at /api/tailors.
pub fn tailors_router() -> Router<AppState> {
    Router::new().route("/", get(list_tailors))
}

#[utoipa::path(
    get,
    path = "/api/tailors",
    params(Pagination),
    responses(
        (status = 200, description = "Tailor directory", body = ApiResponse<TailorProfileList>)
    ),
    tag = "profiles"
)]
pub async fn list_tailors(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<TailorProfileList>>> {
    Ok(Json(profile_service::list_tailors(&state.pool, pagination).await?))
}
