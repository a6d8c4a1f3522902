use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order_status::OrderStatus;

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// The flat measurement record attached to a client profile. All fields
/// are optional; a partial update merges field-wise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Measurements {
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub inseam: Option<f64>,
    pub shoulder: Option<f64>,
    pub sleeve: Option<f64>,
    pub neck: Option<f64>,
    pub thigh: Option<f64>,
    pub calf: Option<f64>,
    pub ankle: Option<f64>,
    pub front_waist_length: Option<f64>,
    pub back_waist_length: Option<f64>,
    pub across_front: Option<f64>,
    pub across_back: Option<f64>,
    pub bust_point: Option<f64>,
    pub armhole: Option<f64>,
    pub wrist: Option<f64>,
    pub rise_height: Option<f64>,
}

impl Measurements {
    /// Overlay `update` on `self`, keeping existing values where the
    /// update carries none.
    pub fn merged_with(&self, update: &Measurements) -> Measurements {
        Measurements {
            chest: update.chest.or(self.chest),
            waist: update.waist.or(self.waist),
            hips: update.hips.or(self.hips),
            inseam: update.inseam.or(self.inseam),
            shoulder: update.shoulder.or(self.shoulder),
            sleeve: update.sleeve.or(self.sleeve),
            neck: update.neck.or(self.neck),
            thigh: update.thigh.or(self.thigh),
            calf: update.calf.or(self.calf),
            ankle: update.ankle.or(self.ankle),
            front_waist_length: update.front_waist_length.or(self.front_waist_length),
            back_waist_length: update.back_waist_length.or(self.back_waist_length),
            across_front: update.across_front.or(self.across_front),
            across_back: update.across_back.or(self.across_back),
            bust_point: update.bust_point.or(self.bust_point),
            armhole: update.armhole.or(self.armhole),
            wrist: update.wrist.or(self.wrist),
            rise_height: update.rise_height.or(self.rise_height),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ClientProfile {
    pub user_id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub notes: String,
    pub preferred_styles: Vec<String>,
    #[sqlx(flatten)]
    pub measurements: Measurements,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DayHours {
    pub open: String,
    pub close: String,
    pub closed: bool,
}

pub type BusinessHours = BTreeMap<String, DayHours>;

/// Default weekly schedule: Mon-Fri 09-17, Saturday mornings, Sunday closed.
pub fn default_business_hours() -> BusinessHours {
    fn day(open: &str, close: &str, closed: bool) -> DayHours {
        DayHours {
            open: open.to_string(),
            close: close.to_string(),
            closed,
        }
    }
    BTreeMap::from([
        ("monday".to_string(), day("09:00", "17:00", false)),
        ("tuesday".to_string(), day("09:00", "17:00", false)),
        ("wednesday".to_string(), day("09:00", "17:00", false)),
        ("thursday".to_string(), day("09:00", "17:00", false)),
        ("friday".to_string(), day("09:00", "17:00", false)),
        ("saturday".to_string(), day("09:00", "13:00", false)),
        ("sunday".to_string(), day("09:00", "13:00", true)),
    ])
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct TailorProfile {
    pub user_id: Uuid,
    pub business_name: String,
    pub owner_name: String,
    pub phone_number: String,
    pub address: String,
    pub bio: String,
    pub specialties: Vec<String>,
    pub years_of_experience: i32,
    pub profile_picture_url: Option<String>,
    pub license_type: String,
    #[schema(value_type = Object)]
    pub business_hours: Json<BusinessHours>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Design {
    pub id: Uuid,
    pub tailor_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub images: Vec<String>,
    pub price: i64,
    pub estimated_days: i32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DESIGN_CATEGORIES: [&str; 8] = [
    "dress",
    "suit",
    "shirt",
    "pants",
    "skirt",
    "coat",
    "accessory",
    "other",
];

/// Order measurements are a free-form name -> value map, unlike the fixed
/// client-profile record. BTreeMap keeps the serialized form stable.
pub type OrderMeasurements = BTreeMap<String, f64>;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub tailor_id: Uuid,
    pub design_id: Option<Uuid>,
    pub status: OrderStatus,
    pub description: String,
    pub measurements: OrderMeasurements,
    pub price: i64,
    pub down_payment: Option<i64>,
    pub estimated_completion_date: Option<DateTime<Utc>>,
    pub attachments: Vec<String>,
    pub notes: Option<String>,
    pub client_notes: Option<String>,
    pub payment_received: bool,
    pub payment_amount: Option<i64>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_note: Option<String>,
    /// Optimistic-concurrency token; bumped on every write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    pub user_id: Uuid,
    pub plan_id: String,
    pub active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub payment_id: Option<String>,
    pub payment_status: Option<String>,
    pub auto_renew: bool,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct SubscriptionPayment {
    pub payment_id: String,
    pub user_id: Uuid,
    pub plan_id: String,
    pub amount: i64,
    pub currency: String,
    pub ref_command: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CustomerConnection {
    pub id: Uuid,
    pub client_id: Uuid,
    pub tailor_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct AppSettings {
    pub id: String,
    pub currency_code: String,
    pub currency_symbol: String,
    pub currency_position: String,
    pub company_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_merge_keeps_existing_values() {
        let base = Measurements {
            chest: Some(100.0),
            waist: Some(85.0),
            ..Default::default()
        };
        let update = Measurements {
            waist: Some(86.5),
            hips: Some(95.0),
            ..Default::default()
        };
        let merged = base.merged_with(&update);
        assert_eq!(merged.chest, Some(100.0));
        assert_eq!(merged.waist, Some(86.5));
        assert_eq!(merged.hips, Some(95.0));
        assert_eq!(merged.neck, None);
    }
}
