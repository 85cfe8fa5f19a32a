use super::sea_orm_active_enums::{RewardType, TransactionType};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reward")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub wallet_id: i32,
    pub user_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub amount: Decimal,
    pub reward_type: RewardType,
    pub transaction_type: TransactionType,
    pub expired_at: i64,
    pub survey_id: Option<i32>,
    pub admin_id: Option<i32>,
    // set once by the expiry sweep
    pub swept_at: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub reclaimed_amount: Option<Decimal>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
