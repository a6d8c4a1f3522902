use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::auth::AuthUser,
    models::Design,
    response::ApiResponse,
    routes::params::{DesignQuery, Pagination},
    services::design_service,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDesignRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: i64,
    #[serde(default = "default_estimated_days")]
    pub estimated_days: i32,
    #[serde(default)]
    pub is_public: bool,
}

fn default_estimated_days() -> i32 {
    7
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDesignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub price: Option<i64>,
    pub estimated_days: Option<i32>,
    pub is_public: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct DesignList {
    pub items: Vec<Design>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_public))
        .route("/", post(create_design))
        .route("/mine", get(list_mine))
        .route("/{id}", get(get_public))
        .route("/{id}", put(update_design))
        .route("/{id}", delete(delete_design))
}

#[utoipa::path(
    get,
    path = "/api/designs",
    params(DesignQuery),
    responses(
        (status = 200, description = "Public gallery", body = ApiResponse<DesignList>)
    ),
    tag = "designs"
)]
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<DesignQuery>,
) -> AppResult<Json<ApiResponse<DesignList>>> {
    Ok(Json(design_service::list_public(&state.pool, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/designs/mine",
    params(Pagination),
    responses(
        (status = 200, description = "Caller's designs, drafts included", body = ApiResponse<DesignList>)
    ),
    security(("bearer_auth" = [])),
    tag = "designs"
)]
pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<DesignList>>> {
    Ok(Json(design_service::list_mine(&state.pool, &user, pagination).await?))
}

#[utoipa::path(
    get,
    path = "/api/designs/{id}",
    params(("id" = Uuid, Path, description = "Design id")),
    responses(
        (status = 200, description = "Design", body = ApiResponse<Design>),
        (status = 404, description = "Not found or not public")
    ),
    tag = "designs"
)]
pub async fn get_public(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Design>>> {
    Ok(Json(design_service::get_public(&state.pool, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/designs",
    request_body = CreateDesignRequest,
    responses(
        (status = 200, description = "Design created", body = ApiResponse<Design>),
        (status = 403, description = "Tailor only")
    ),
    security(("bearer_auth" = [])),
    tag = "designs"
)]
pub async fn create_design(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDesignRequest>,
) -> AppResult<Json<ApiResponse<Design>>> {
    Ok(Json(design_service::create_design(&state.pool, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/designs/{id}",
    params(("id" = Uuid, Path, description = "Design id")),
    request_body = UpdateDesignRequest,
    responses(
        (status = 200, description = "Design updated", body = ApiResponse<Design>),
        (status = 404, description = "Not found or not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "designs"
)]
pub async fn update_design(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDesignRequest>,
) -> AppResult<Json<ApiResponse<Design>>> {
    Ok(Json(design_service::update_design(&state.pool, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/designs/{id}",
    params(("id" = Uuid, Path, description = "Design id")),
    responses(
        (status = 200, description = "Design deleted"),
        (status = 404, description = "Not found or not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "designs"
)]
pub async fn delete_design(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(design_service::delete_design(&state.pool, &user, id).await?))
}
