use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    dto::payments::{
        CreatePaymentRequest, CreatePaymentResponse, OrderPaymentStatusResponse,
        SubscriptionStatusResponse, UpdateOrderPaymentStatusRequest, WebhookPayload,
        WebhookResponse,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    plans::{PLANS, SubscriptionPlan},
    response::{ApiResponse, Meta},
    services::payment_service,
    state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaymentStatusQuery {
    pub client_id: Uuid,
    pub tailor_id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/create-payment", post(create_payment))
        .route("/subscription-status/{user_id}", get(subscription_status))
        .route("/webhook", post(webhook))
        .route("/order/update-payment-status", post(update_order_payment_status))
        .route("/order/payment-status/{order_id}", get(order_payment_status))
}

#[utoipa::path(
    get,
    path = "/routes/plans",
    responses(
        (status = 200, description = "Available subscription plans", body = ApiResponse<Vec<SubscriptionPlan>>)
    ),
    tag = "payments"
)]
pub async fn list_plans() -> Json<ApiResponse<Vec<SubscriptionPlan>>> {
    Json(ApiResponse::success(
        "Plans",
        PLANS.to_vec(),
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    post,
    path = "/routes/create-payment",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Session created or free plan activated", body = ApiResponse<CreatePaymentResponse>),
        (status = 404, description = "Unknown plan"),
        (status = 502, description = "Payment provider unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<ApiResponse<CreatePaymentResponse>>> {
    Ok(Json(payment_service::create_payment(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/routes/subscription-status/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Current subscription", body = ApiResponse<SubscriptionStatusResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn subscription_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SubscriptionStatusResponse>>> {
    Ok(Json(payment_service::subscription_status(&state, &user, user_id).await?))
}

// Unauthenticated by design: the provider proves itself inside the payload.
#[utoipa::path(
    post,
    path = "/routes/webhook",
    request_body = WebhookPayload,
    responses(
        (status = 200, description = "Event processed", body = ApiResponse<WebhookResponse>),
        (status = 403, description = "Credential digests do not match"),
        (status = 404, description = "Unknown ref_command")
    ),
    tag = "payments"
)]
pub async fn webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> AppResult<Json<ApiResponse<WebhookResponse>>> {
    Ok(Json(payment_service::handle_webhook(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/routes/order/update-payment-status",
    request_body = UpdateOrderPaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status recorded", body = ApiResponse<OrderPaymentStatusResponse>),
        (status = 403, description = "Only the order's tailor may record payments"),
        (status = 409, description = "Version conflict")
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn update_order_payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateOrderPaymentStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderPaymentStatusResponse>>> {
    Ok(Json(payment_service::update_order_payment_status(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/routes/order/payment-status/{order_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order id"),
        PaymentStatusQuery,
    ),
    responses(
        (status = 200, description = "Payment status", body = ApiResponse<OrderPaymentStatusResponse>),
        (status = 404, description = "No order for this (order, client, tailor) triple")
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn order_payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Query(query): Query<PaymentStatusQuery>,
) -> AppResult<Json<ApiResponse<OrderPaymentStatusResponse>>> {
    Ok(Json(
        payment_service::get_order_payment_status(
            &state,
            &user,
            order_id,
            query.client_id,
            query.tailor_id,
        )
        .await?,
    ))
}
