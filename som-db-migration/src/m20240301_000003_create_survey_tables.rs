use sea_orm_migration::prelude::*;
use som_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000003_create_survey_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(sot::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(sot::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(sot::Column::Name).string().not_null())
                    .col(ColumnDef::new(sot::Column::OwnerAddress).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(survey::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(survey::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(survey::Column::UserId).integer().not_null())
                    .col(ColumnDef::new(survey::Column::Title).string().not_null())
                    .col(ColumnDef::new(survey::Column::FeePaid).boolean().not_null())
                    .col(ColumnDef::new(survey::Column::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(survey::Column::RewardAmount)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(survey::Column::RewardeesCount)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(survey::Column::StartingDate)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(survey::Column::EndingDate)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(survey::Column::RewardsDistributed)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(survey::Column::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(survey_sot::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(survey_sot::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(survey_sot::Column::SurveyId).integer().not_null())
                    .col(ColumnDef::new(survey_sot::Column::SotId).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-survey-sot-survey-sot")
                    .table(survey_sot::Entity)
                    .col(survey_sot::Column::SurveyId)
                    .col(survey_sot::Column::SotId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(survey_participant::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(survey_participant::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(survey_participant::Column::SurveyId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(survey_participant::Column::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(survey_participant::Column::OptionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(survey_participant::Column::CreatedAt)
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
                    .name("idx-survey-participant-survey-user")
                    .table(survey_participant::Entity)
                    .col(survey_participant::Column::SurveyId)
                    .col(survey_participant::Column::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(profit_payment::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(profit_payment::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(profit_payment::Column::OwnerAddress)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(profit_payment::Column::AmountInSom)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(profit_payment::Column::TransactionRef)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(profit_payment::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(pending_profit::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(pending_profit::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(pending_profit::Column::SotId).integer().not_null())
                    .col(
                        ColumnDef::new(pending_profit::Column::SurveyId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(pending_profit::Column::OwnerAddress)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(pending_profit::Column::AmountInSom)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(pending_profit::Column::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(pending_profit::Column::ProfitPaymentId).integer())
                    .col(
                        ColumnDef::new(pending_profit::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // one pending profit per (survey, sot)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-pending-profit-survey-sot")
                    .table(pending_profit::Entity)
                    .col(pending_profit::Column::SurveyId)
                    .col(pending_profit::Column::SotId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(pending_profit::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(profit_payment::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(survey_participant::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(survey_sot::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(survey::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(sot::Entity).to_owned())
            .await
    }
}
