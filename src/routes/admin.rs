use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::orders::OrderList,
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, Subscription, User},
    response::ApiResponse,
    routes::params::{OrderListQuery, Pagination},
    services::admin_service,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRoleRequest {
    pub email: String,
    /// `client`, `tailor` or `admin`.
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminCheckResponse {
    pub user_id: Uuid,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForceOrderStatusRequest {
    pub status: String,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleSubscriptionRequest {
    pub active: bool,
}

#[derive(Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/role", put(set_role))
        .route("/check", get(check_admin))
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}/status", post(force_order_status))
        .route("/subscriptions", get(list_subscriptions))
        .route("/subscriptions/{user_id}", put(toggle_subscription))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(Pagination),
    responses(
        (status = 200, description = "All users", body = ApiResponse<UserList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    Ok(Json(admin_service::list_users(&state, &user, pagination).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/role",
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<User>),
        (status = 404, description = "No user with that email")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn set_role(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SetRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(admin_service::set_role(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/check",
    responses(
        (status = 200, description = "Whether the caller is an admin", body = ApiResponse<AdminCheckResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn check_admin(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AdminCheckResponse>>> {
    Ok(Json(admin_service::check_admin(&state, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Every order in the system", body = ApiResponse<OrderList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(admin_service::list_all_orders(&state, &user, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ForceOrderStatusRequest,
    responses(
        (status = 200, description = "Status overridden", body = ApiResponse<Order>),
        (status = 409, description = "Version conflict")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn force_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ForceOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(admin_service::force_order_status(&state, &user, id, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/subscriptions",
    params(Pagination),
    responses(
        (status = 200, description = "All subscriptions", body = ApiResponse<Vec<Subscription>>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Vec<Subscription>>>> {
    Ok(Json(admin_service::list_subscriptions(&state, &user, pagination).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/subscriptions/{user_id}",
    params(("user_id" = Uuid, Path, description = "Subscriber user id")),
    request_body = ToggleSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription toggled", body = ApiResponse<Subscription>),
        (status = 404, description = "No subscription for that user")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn toggle_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ToggleSubscriptionRequest>,
) -> AppResult<Json<ApiResponse<Subscription>>> {
    Ok(Json(
        admin_service::set_subscription_active(&state, &user, user_id, payload.active).await?,
    ))
}
