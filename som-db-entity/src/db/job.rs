use super::sea_orm_active_enums::JobStatus;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "job")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: String,
    pub payload: String,
    // unix millis
    pub run_at: i64,
    pub attempts: i32,
    pub max_attempts: i32,
    pub status: JobStatus,
    pub last_error: Option<String>,
    // unix millis of the claim while running
    pub locked_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
