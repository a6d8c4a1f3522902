use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::auth::AuthUser,
    models::CustomerConnection,
    response::ApiResponse,
    services::connection_service,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConnectionRequest {
    pub tailor_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateConnectionRequest {
    /// `accepted` or `rejected`.
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ConnectionList {
    pub items: Vec<CustomerConnection>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ConnectionQuery {
    pub status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_connection))
        .route("/", get(list_connections))
        .route("/{id}", patch(update_connection_status))
}

#[utoipa::path(
    post,
    path = "/api/connections",
    request_body = CreateConnectionRequest,
    responses(
        (status = 200, description = "Connection requested", body = ApiResponse<CustomerConnection>),
        (status = 400, description = "Unknown tailor or connection already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "connections"
)]
pub async fn create_connection(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateConnectionRequest>,
) -> AppResult<Json<ApiResponse<CustomerConnection>>> {
    Ok(Json(connection_service::create_connection(&state.pool, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/connections",
    params(ConnectionQuery),
    responses(
        (status = 200, description = "Connections the caller participates in", body = ApiResponse<ConnectionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "connections"
)]
pub async fn list_connections(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ConnectionQuery>,
) -> AppResult<Json<ApiResponse<ConnectionList>>> {
    Ok(Json(connection_service::list_connections(&state.pool, &user, query.status).await?))
}

#[utoipa::path(
    patch,
    path = "/api/connections/{id}",
    params(("id" = Uuid, Path, description = "Connection id")),
    request_body = UpdateConnectionRequest,
    responses(
        (status = 200, description = "Connection resolved", body = ApiResponse<CustomerConnection>),
        (status = 409, description = "Already resolved concurrently")
    ),
    security(("bearer_auth" = [])),
    tag = "connections"
)]
pub async fn update_connection_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateConnectionRequest>,
) -> AppResult<Json<ApiResponse<CustomerConnection>>> {
    Ok(Json(
        connection_service::update_connection_status(&state.pool, &user, id, payload).await?,
    ))
}
