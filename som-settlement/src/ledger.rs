//! Balance mutations on a wallet row.
//!
//! Every mutation is a single `UPDATE wallet SET col = col ± amount`, so
//! concurrent units of work never lose each other's writes. Only
//! [`try_debit`] checks the balance, and it does so in the same statement.

use crate::error::{SettlementError, SettlementResult};
use crate::fin_cal::usd_to_som;
use crate::sql_stmt;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter, Statement,
};
use som_db_entity::db::wallet::{
    Column as WalletColumn, Entity as Wallet, Model as WalletModel,
};

fn check_amount(amount: Decimal) -> SettlementResult<()> {
    if amount.is_sign_negative() {
        return Err(SettlementError::InvalidAmount(amount));
    }
    Ok(())
}

fn wallet_not_found(wallet_id: i32) -> SettlementError {
    SettlementError::WalletNotFound(format!("wallet {}", wallet_id))
}

pub async fn find_wallet<C>(conn: &C, wallet_id: i32) -> SettlementResult<WalletModel>
where
    C: ConnectionTrait,
{
    Wallet::find_by_id(wallet_id)
        .one(conn)
        .await?
        .ok_or_else(|| wallet_not_found(wallet_id))
}

pub async fn find_wallet_by_user<C>(conn: &C, user_id: i32) -> SettlementResult<WalletModel>
where
    C: ConnectionTrait,
{
    Wallet::find()
        .filter(WalletColumn::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| SettlementError::WalletNotFound(format!("user {}", user_id)))
}

pub async fn credit<C>(conn: &C, wallet_id: i32, amount: Decimal) -> SettlementResult<()>
where
    C: ConnectionTrait,
{
    check_amount(amount)?;
    let result = Wallet::update_many()
        .col_expr(WalletColumn::Balance, Expr::col(WalletColumn::Balance).add(amount))
        .col_expr(
            WalletColumn::TotalReceived,
            Expr::col(WalletColumn::TotalReceived).add(amount),
        )
        .filter(WalletColumn::Id.eq(wallet_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(wallet_not_found(wallet_id));
    }
    Ok(())
}

/// Unconditional debit. Callers validate the balance beforehand or hold the
/// wallet lock; use [`try_debit`] when the check must be atomic.
pub async fn debit<C>(conn: &C, wallet_id: i32, amount: Decimal) -> SettlementResult<()>
where
    C: ConnectionTrait,
{
    check_amount(amount)?;
    let result = Wallet::update_many()
        .col_expr(WalletColumn::Balance, Expr::col(WalletColumn::Balance).sub(amount))
        .col_expr(
            WalletColumn::TotalSent,
            Expr::col(WalletColumn::TotalSent).add(amount),
        )
        .filter(WalletColumn::Id.eq(wallet_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(wallet_not_found(wallet_id));
    }
    Ok(())
}

/// Debits only if the balance covers `amount`.
pub async fn try_debit<C>(conn: &C, wallet_id: i32, amount: Decimal) -> SettlementResult<()>
where
    C: ConnectionTrait,
{
    check_amount(amount)?;
    let result = Wallet::update_many()
        .col_expr(WalletColumn::Balance, Expr::col(WalletColumn::Balance).sub(amount))
        .col_expr(
            WalletColumn::TotalSent,
            Expr::col(WalletColumn::TotalSent).add(amount),
        )
        .filter(WalletColumn::Id.eq(wallet_id))
        .filter(WalletColumn::Balance.gte(amount))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        let wallet = find_wallet(conn, wallet_id).await?;
        return Err(SettlementError::BalanceLessThanRequired {
            balance: wallet.balance,
            required: amount,
        });
    }
    Ok(())
}

/// Credits the SoM equivalent of `usd_amount` and returns it.
pub async fn record_recharge<C>(
    conn: &C,
    wallet_id: i32,
    usd_amount: Decimal,
) -> SettlementResult<Decimal>
where
    C: ConnectionTrait,
{
    if usd_amount <= Decimal::ZERO {
        return Err(SettlementError::InvalidAmount(usd_amount));
    }
    let som = usd_to_som(usd_amount);
    let result = Wallet::update_many()
        .col_expr(WalletColumn::Balance, Expr::col(WalletColumn::Balance).add(som))
        .col_expr(
            WalletColumn::TotalRecharged,
            Expr::col(WalletColumn::TotalRecharged).add(som),
        )
        .filter(WalletColumn::Id.eq(wallet_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(wallet_not_found(wallet_id));
    }
    Ok(som)
}

/// Reclaims an expired reward amount.
pub async fn expire<C>(conn: &C, wallet_id: i32, amount: Decimal) -> SettlementResult<()>
where
    C: ConnectionTrait,
{
    check_amount(amount)?;
    let result = Wallet::update_many()
        .col_expr(WalletColumn::Balance, Expr::col(WalletColumn::Balance).sub(amount))
        .col_expr(
            WalletColumn::TotalSomExpired,
            Expr::col(WalletColumn::TotalSomExpired).add(amount),
        )
        .filter(WalletColumn::Id.eq(wallet_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(wallet_not_found(wallet_id));
    }
    Ok(())
}

/// Row-locks the wallet for the rest of the transaction and returns it.
/// SQLite serializes writers already, so only Postgres issues the lock.
pub async fn lock_wallet<C>(conn: &C, wallet_id: i32) -> SettlementResult<WalletModel>
where
    C: ConnectionTrait,
{
    if conn.get_database_backend() == DbBackend::Postgres {
        conn.execute(Statement::from_sql_and_values(
            sql_stmt::DB_BACKEND,
            sql_stmt::LOCK_WALLET,
            vec![wallet_id.into()],
        ))
        .await?;
    }
    find_wallet(conn, wallet_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_credit_and_debit_update_totals() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "alice", Decimal::from(100)).await;

        credit(&db, wallet.id, Decimal::from(25)).await.unwrap();
        debit(&db, wallet.id, Decimal::from(40)).await.unwrap();

        let wallet = find_wallet(&db, wallet.id).await.unwrap();
        assert_close(wallet.balance, Decimal::from(85));
        assert_close(wallet.total_received, Decimal::from(25));
        assert_close(wallet.total_sent, Decimal::from(40));
    }

    #[tokio::test]
    async fn test_debit_does_not_check_balance() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "bob", Decimal::from(5)).await;
        debit(&db, wallet.id, Decimal::from(8)).await.unwrap();
        let wallet = find_wallet(&db, wallet.id).await.unwrap();
        assert_close(wallet.balance, Decimal::from(-3));
    }

    #[tokio::test]
    async fn test_try_debit_rejects_insufficient_balance() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "carol", Decimal::from(10)).await;

        let error = try_debit(&db, wallet.id, Decimal::from(11)).await.unwrap_err();
        assert_eq!(error.code(), "BALANCE_LESS_THAN_REQUIRED");
        try_debit(&db, wallet.id, Decimal::from(10)).await.unwrap();

        let wallet = find_wallet(&db, wallet.id).await.unwrap();
        assert_close(wallet.balance, Decimal::ZERO);
        assert_close(wallet.total_sent, Decimal::from(10));
    }

    #[tokio::test]
    async fn test_record_recharge_and_expire() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "dave", Decimal::ZERO).await;

        let som = record_recharge(&db, wallet.id, Decimal::new(125, 1)).await.unwrap();
        assert_eq!(som, Decimal::from(125));
        expire(&db, wallet.id, Decimal::from(20)).await.unwrap();

        let wallet = find_wallet(&db, wallet.id).await.unwrap();
        assert_close(wallet.balance, Decimal::from(105));
        assert_close(wallet.total_recharged, Decimal::from(125));
        assert_close(wallet.total_som_expired, Decimal::from(20));

        let error = record_recharge(&db, wallet.id, Decimal::ZERO).await.unwrap_err();
        assert_eq!(error.code(), "INVALID_AMOUNT");
    }

    #[tokio::test]
    async fn test_missing_wallet() {
        let db = setup_db().await;
        let error = credit(&db, 404, Decimal::ONE).await.unwrap_err();
        assert_eq!(error.code(), "WALLET_NOT_FOUND");
        let error = find_wallet_by_user(&db, 404).await.unwrap_err();
        assert_eq!(error.to_string(), "Wallet not found for user 404");
        assert!(lock_wallet(&db, 404).await.is_err());
    }
}
