use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        ApplyActionRequest, AttachmentRequest, CreateOrderRequest, OrderList,
        UpdateClientOrderRequest, UpdateOrderDetailsRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/", get(list_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/action", post(apply_action))
        .route("/{id}/details", put(update_details))
        .route("/{id}/client", patch(update_client_order))
        .route("/{id}/attachments", post(add_attachment))
        .route("/{id}/attachments", delete(remove_attachment))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = ApiResponse<Order>),
        (status = 403, description = "Only clients can create orders")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(order_service::create_order(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders visible to the caller", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(order_service::list_orders(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<Order>),
        (status = 404, description = "Not found or not a participant")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(order_service::get_order(&state, &user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/action",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ApplyActionRequest,
    responses(
        (status = 200, description = "Order advanced", body = ApiResponse<Order>),
        (status = 409, description = "Version conflict"),
        (status = 422, description = "Transition not allowed for this actor/status")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn apply_action(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplyActionRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(order_service::apply_action(&state, &user, id, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/details",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderDetailsRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<Order>),
        (status = 403, description = "Tailor only"),
        (status = 409, description = "Version conflict")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn update_details(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderDetailsRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(order_service::update_details(&state, &user, id, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/client",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateClientOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<Order>),
        (status = 403, description = "Client only"),
        (status = 409, description = "Version conflict")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn update_client_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(order_service::update_client_order(&state, &user, id, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/attachments",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AttachmentRequest,
    responses(
        (status = 200, description = "Attachment added", body = ApiResponse<Order>)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn add_attachment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachmentRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(order_service::add_attachment(&state, &user, id, payload.url).await?))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}/attachments",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AttachmentRequest,
    responses(
        (status = 200, description = "Attachment removed", body = ApiResponse<Order>)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn remove_attachment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachmentRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(order_service::remove_attachment(&state, &user, id, payload.url).await?))
}
