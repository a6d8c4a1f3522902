use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub tailor_id: Uuid,
    pub design_id: Option<Uuid>,
    pub status: String,
    pub description: String,
    pub measurements: Json,
    pub price: i64,
    pub down_payment: Option<i64>,
    pub estimated_completion_date: Option<DateTimeWithTimeZone>,
    pub attachments: Json,
    pub notes: Option<String>,
    pub client_notes: Option<String>,
    pub payment_received: bool,
    pub payment_amount: Option<i64>,
    pub payment_date: Option<DateTimeWithTimeZone>,
    pub payment_note: Option<String>,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
