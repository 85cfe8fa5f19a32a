use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use sea_orm_migration::prelude::*;
use serde::Deserialize;

#[derive(Deserialize)]
struct MigrationConfig {
    database_url: Option<String>,
}

#[tokio::main]
async fn main() {
    // the cli reads DATABASE_URL, fall back to the worker's App.toml
    if std::env::var("DATABASE_URL").is_err() {
        let config: Result<MigrationConfig, _> = Figment::new()
            .merge(Toml::file("App.toml"))
            .merge(Env::prefixed("SOM_"))
            .extract();
        if let Ok(MigrationConfig {
            database_url: Some(database_url),
        }) = config
        {
            std::env::set_var("DATABASE_URL", database_url);
        }
    }
    cli::run_cli(som_db_migration::Migrator).await;
}
