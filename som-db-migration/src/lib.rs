pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_wallet_tables;
mod m20240301_000002_create_user_tables;
mod m20240301_000003_create_survey_tables;
mod m20240301_000004_create_marketplace_tables;
mod m20240301_000005_create_job_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_wallet_tables::Migration),
            Box::new(m20240301_000002_create_user_tables::Migration),
            Box::new(m20240301_000003_create_survey_tables::Migration),
            Box::new(m20240301_000004_create_marketplace_tables::Migration),
            Box::new(m20240301_000005_create_job_table::Migration),
        ]
    }
}
