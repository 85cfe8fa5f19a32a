pub mod bonus;
pub mod config;
pub mod distribution;
pub mod dto;
pub mod error;
pub mod expiry;
pub mod fin_cal;
pub mod gateway;
pub mod ledger;
pub mod notification;
pub mod participation;
pub mod payment;
pub mod profit;
pub mod respect;
pub mod reward;
pub mod scheduler;
pub mod service;
mod sql_stmt;
pub mod streak;
pub mod unit_of_work;

#[cfg(test)]
mod test_utils;

pub use config::{get_db_connection, Config};
pub use error::{SettlementError, SettlementResult};
pub use service::Settlement;
