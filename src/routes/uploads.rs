use axum::{Json, Router, extract::State, routing::{get, post}};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    cloudinary,
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignatureRequest {
    #[serde(default = "default_folder")]
    pub folder: String,
    pub public_id: Option<String>,
}

fn default_folder() -> String {
    "couture".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignatureResponse {
    pub signature: String,
    pub timestamp: i64,
    pub api_key: String,
    pub cloud_name: String,
    pub folder: String,
    pub public_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigCheckResponse {
    pub paytech_configured: bool,
    pub cloudinary_configured: bool,
    pub database_ok: bool,
    pub public_base_url: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-signature", post(generate_signature))
        .route("/status", get(cloudinary_status))
        .route("/test-config", post(test_config))
}

#[utoipa::path(
    post,
    path = "/routes/generate-signature",
    request_body = SignatureRequest,
    responses(
        (status = 200, description = "Signed upload credentials", body = ApiResponse<SignatureResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "uploads"
)]
pub async fn generate_signature(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<SignatureRequest>,
) -> AppResult<Json<ApiResponse<SignatureResponse>>> {
    let secret = cloudinary::require_secret(&state.config.cloudinary)?;
    let timestamp = Utc::now().timestamp();
    let signature = cloudinary::sign_upload(
        secret,
        &payload.folder,
        payload.public_id.as_deref(),
        timestamp,
    );

    let response = SignatureResponse {
        signature,
        timestamp,
        api_key: state.config.cloudinary.api_key.clone().unwrap_or_default(),
        cloud_name: state.config.cloudinary.cloud_name.clone().unwrap_or_default(),
        folder: payload.folder,
        public_id: payload.public_id,
    };
    Ok(Json(ApiResponse::success(
        "Upload signature",
        response,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/routes/status",
    responses(
        (status = 200, description = "Cloudinary connectivity", body = ApiResponse<ServiceStatus>)
    ),
    tag = "uploads"
)]
pub async fn cloudinary_status(
    State(state): State<AppState>,
) -> Json<ApiResponse<ServiceStatus>> {
    let (status, message) = cloudinary::check_status(&state.http, &state.config.cloudinary).await;
    Json(ApiResponse::success(
        "Cloudinary status",
        ServiceStatus { status, message },
        Some(Meta::empty()),
    ))
}

/// Reports which external integrations are configured, without leaking
/// any credential values.
#[utoipa::path(
    post,
    path = "/routes/test-config",
    responses(
        (status = 200, description = "Configuration summary", body = ApiResponse<ConfigCheckResponse>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "uploads"
)]
pub async fn test_config(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ConfigCheckResponse>>> {
    ensure_admin(&user)?;
    let paytech = &state.config.paytech;
    let cloudinary = &state.config.cloudinary;
    let database_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();
    Ok(Json(ApiResponse::success(
        "Configuration",
        ConfigCheckResponse {
            paytech_configured: paytech.api_key.is_some() && paytech.secret_key.is_some(),
            cloudinary_configured: cloudinary.cloud_name.is_some()
                && cloudinary.api_key.is_some()
                && cloudinary.api_secret.is_some(),
            database_ok,
            public_base_url: state.config.public_base_url.clone(),
        },
        Some(Meta::empty()),
    )))
}
