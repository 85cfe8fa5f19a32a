use sea_orm::DbBackend;

pub const DB_BACKEND: DbBackend = DbBackend::Postgres;

/// Holds the wallet row until the surrounding transaction ends.
pub const LOCK_WALLET: &str = r#"SELECT id FROM wallet WHERE id = $1 FOR UPDATE"#;
