use super::sea_orm_active_enums::SurveyStatus;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "survey")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    // initiator
    pub user_id: i32,
    pub title: String,
    pub fee_paid: bool,
    pub status: SurveyStatus,
    #[sea_orm(column_type = "Decimal(Some((16, 5)))")]
    pub reward_amount: Decimal,
    pub rewardees_count: i32,
    pub starting_date: i64,
    pub ending_date: i64,
    pub rewards_distributed: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
