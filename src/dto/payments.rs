use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub user_id: Uuid,
    pub plan_id: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
}

fn default_payment_method() -> String {
    "paytech".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    pub redirect_url: String,
    pub status: String,
    pub message: String,
}

/// Paytech IPN payload. Authenticity is proven by the SHA-256 digests of
/// the merchant credentials; everything else is advisory.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookPayload {
    pub type_event: String,
    pub ref_command: String,
    pub api_key_sha256: String,
    pub secret_sha256: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub item_price: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderPaymentStatusRequest {
    pub order_id: Uuid,
    pub client_id: Uuid,
    pub tailor_id: Uuid,
    pub payment_received: bool,
    pub payment_amount: i64,
    pub payment_note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPaymentStatusResponse {
    pub order_id: Uuid,
    pub status: String,
    pub client_id: Uuid,
    pub tailor_id: Uuid,
    pub payment_received: bool,
    pub payment_amount: Option<i64>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionStatusResponse {
    pub user_id: Uuid,
    pub plan_id: String,
    pub active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub payment_status: Option<String>,
    pub auto_renew: bool,
}
