use sea_orm_migration::prelude::*;
use som_db_entity::db::job;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000005_create_job_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(job::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(job::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(job::Column::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(job::Column::Payload).text().not_null())
                    .col(ColumnDef::new(job::Column::RunAt).big_integer().not_null())
                    .col(ColumnDef::new(job::Column::Attempts).integer().not_null())
                    .col(ColumnDef::new(job::Column::MaxAttempts).integer().not_null())
                    .col(ColumnDef::new(job::Column::Status).string_len(16).not_null())
                    .col(ColumnDef::new(job::Column::LastError).text())
                    .col(ColumnDef::new(job::Column::LockedAt).big_integer())
                    .col(ColumnDef::new(job::Column::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-job-status-run-at")
                    .table(job::Entity)
                    .col(job::Column::Status)
                    .col(job::Column::RunAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(job::Entity).to_owned())
            .await
    }
}
