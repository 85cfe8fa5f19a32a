use super::sea_orm_active_enums::{PaymentStatus, PaymentType, TransactionType};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub wallet_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub payment_status: PaymentStatus,
    pub transaction_type: TransactionType,
    pub expired_at: Option<i64>,
    pub survey_id: Option<i32>,
    pub order_id: Option<i32>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
