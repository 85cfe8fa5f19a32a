use sea_orm_migration::prelude::*;
use som_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000001_create_wallet_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(wallet::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(wallet::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(wallet::Column::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(wallet::Column::Balance)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet::Column::TotalReceived)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet::Column::TotalSent)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet::Column::TotalRecharged)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet::Column::TotalSomExpired)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(payment::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(payment::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(payment::Column::WalletId).integer().not_null())
                    .col(
                        ColumnDef::new(payment::Column::Amount)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(payment::Column::PaymentType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(payment::Column::PaymentStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(payment::Column::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(payment::Column::ExpiredAt).big_integer())
                    .col(ColumnDef::new(payment::Column::SurveyId).integer())
                    .col(ColumnDef::new(payment::Column::OrderId).integer())
                    .col(
                        ColumnDef::new(payment::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(reward::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(reward::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(reward::Column::WalletId).integer().not_null())
                    .col(ColumnDef::new(reward::Column::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(reward::Column::Amount)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(reward::Column::RewardType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(reward::Column::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(reward::Column::ExpiredAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(reward::Column::SurveyId).integer())
                    .col(ColumnDef::new(reward::Column::AdminId).integer())
                    .col(ColumnDef::new(reward::Column::SweptAt).big_integer())
                    .col(ColumnDef::new(reward::Column::ReclaimedAmount).decimal_len(16, 5))
                    .col(
                        ColumnDef::new(reward::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // the sweep scans unswept rewards by expiry
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-reward-swept-expired")
                    .table(reward::Entity)
                    .col(reward::Column::SweptAt)
                    .col(reward::Column::ExpiredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(wallet_recharge::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(wallet_recharge::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(wallet_recharge::Column::WalletId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet_recharge::Column::PaymentId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet_recharge::Column::AmountInUsd)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet_recharge::Column::AmountInSom)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet_recharge::Column::RechargeType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet_recharge::Column::ExternalOrderId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(wallet_recharge::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(wallet_recharge::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(reward::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(payment::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(wallet::Entity).to_owned())
            .await
    }
}
