use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_sot")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub survey_id: i32,
    pub sot_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sot::Entity",
        from = "Column::SotId",
        to = "super::sot::Column::Id"
    )]
    Sot,
}

impl Related<super::sot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
