use sea_orm_migration::prelude::*;
use som_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000002_create_user_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(user::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(user::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(user::Column::Nickname).string().not_null())
                    .col(ColumnDef::new(user::Column::RespectLevel).integer().not_null())
                    .col(
                        ColumnDef::new(user::Column::RespectLevelPoints)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(user::Column::AttendanceStreak)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(user::Column::ParticipationStreak)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(user::Column::InfoCompletedRewarded)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(user::Column::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(user_respect_policy::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(user_respect_policy::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(user_respect_policy::Column::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(user_respect_policy::Column::TenAttendanceExpiry)
                            .big_integer(),
                    )
                    .col(
                        ColumnDef::new(user_respect_policy::Column::TenParticipationExpiry)
                            .big_integer(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(attendance::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(attendance::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(attendance::Column::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(attendance::Column::Kind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(attendance::Column::MarkedOn).date().not_null())
                    .col(
                        ColumnDef::new(attendance::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-attendance-user-kind-day")
                    .table(attendance::Entity)
                    .col(attendance::Column::UserId)
                    .col(attendance::Column::Kind)
                    .col(attendance::Column::MarkedOn)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(notification::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(notification::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(notification::Column::UserId).integer().not_null())
                    .col(ColumnDef::new(notification::Column::Kind).string().not_null())
                    .col(ColumnDef::new(notification::Column::Title).string().not_null())
                    .col(ColumnDef::new(notification::Column::Body).text().not_null())
                    .col(ColumnDef::new(notification::Column::IsRead).boolean().not_null())
                    .col(
                        ColumnDef::new(notification::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(notification::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(attendance::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(user_respect_policy::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(user::Entity).to_owned())
            .await
    }
}
