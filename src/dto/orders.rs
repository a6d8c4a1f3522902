use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::order_status::OrderAction,
    models::{Order, OrderMeasurements},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub tailor_id: Uuid,
    pub design_id: Option<Uuid>,
    pub description: String,
    #[serde(default)]
    pub measurements: OrderMeasurements,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// A lifecycle action against an order. `expected_version` lets callers
/// carry the version they last read; when omitted, the version read
/// inside the handler is used as the CAS token.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyActionRequest {
    pub action: OrderAction,
    pub note: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderDetailsRequest {
    pub price: Option<i64>,
    pub down_payment: Option<i64>,
    pub estimated_completion_date: Option<DateTime<Utc>>,
    pub measurements: Option<OrderMeasurements>,
    pub attachments: Option<Vec<String>>,
    pub notes: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateClientOrderRequest {
    pub description: Option<String>,
    pub measurements: Option<OrderMeasurements>,
    pub client_notes: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachmentRequest {
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
