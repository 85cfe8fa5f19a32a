use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_recharge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub wallet_id: i32,
    pub payment_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub amount_in_usd: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub amount_in_som: Decimal,
    pub recharge_type: String,
    pub external_order_id: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
