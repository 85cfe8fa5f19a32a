use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub total_received: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub total_sent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub total_recharged: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub total_som_expired: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
