use super::sea_orm_active_enums::ProfitStatus;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pending_profit")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sot_id: i32,
    pub survey_id: i32,
    pub owner_address: String,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub amount_in_som: Decimal,
    pub status: ProfitStatus,
    pub profit_payment_id: Option<i32>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
