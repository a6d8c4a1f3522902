use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub plan_id: String,
    pub active: bool,
    pub start_date: Option<DateTimeWithTimeZone>,
    pub expiry_date: Option<DateTimeWithTimeZone>,
    pub payment_id: Option<String>,
    pub payment_status: Option<String>,
    pub auto_renew: bool,
    pub version: i64,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
