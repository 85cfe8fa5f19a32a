use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profit_payment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_address: String,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub amount_in_som: Decimal,
    // opaque settlement reference, e.g. an on-chain signature
    pub transaction_ref: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
