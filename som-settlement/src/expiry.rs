use crate::error::SettlementResult;
use crate::ledger;
use crate::unit_of_work::UnitOfWork;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use som_db_entity::db::reward::{Column as RewardColumn, Entity as Reward, Model as RewardModel};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepReport {
    pub swept: usize,
    pub failed: usize,
    pub reclaimed: Decimal,
}

/// Claims one expired reward and takes back what is left of it.
///
/// The debit never drives the balance below zero: a user who already spent
/// the reward loses only the remaining balance.
async fn sweep_reward<C>(
    conn: &C,
    reward: &RewardModel,
    now: i64,
) -> SettlementResult<Option<Decimal>>
where
    C: ConnectionTrait,
{
    let claimed = Reward::update_many()
        .col_expr(RewardColumn::SweptAt, Expr::value(Some(now)))
        .filter(RewardColumn::Id.eq(reward.id))
        .filter(RewardColumn::SweptAt.is_null())
        .exec(conn)
        .await?;
    if claimed.rows_affected == 0 {
        return Ok(None);
    }

    let wallet = ledger::lock_wallet(conn, reward.wallet_id).await?;
    let reclaimed = reward.amount.min(wallet.balance.max(Decimal::ZERO));
    if reclaimed > Decimal::ZERO {
        ledger::expire(conn, wallet.id, reclaimed).await?;
    }
    Reward::update_many()
        .col_expr(RewardColumn::ReclaimedAmount, Expr::value(Some(reclaimed)))
        .filter(RewardColumn::Id.eq(reward.id))
        .exec(conn)
        .await?;
    Ok(Some(reclaimed))
}

/// Reclaims every reward past its expiry that has not been swept yet, reading
/// `batch_size` rewards at a time. Each reward commits on its own; a failure
/// is logged and left for the next run.
pub async fn sweep_expired_rewards(
    db: &DatabaseConnection,
    now: i64,
    batch_size: u64,
) -> SettlementResult<SweepReport> {
    let mut report = SweepReport::default();
    let mut after_id = 0;
    loop {
        let expired = Reward::find()
            .filter(RewardColumn::ExpiredAt.lt(now))
            .filter(RewardColumn::SweptAt.is_null())
            .filter(RewardColumn::Id.gt(after_id))
            .order_by_asc(RewardColumn::Id)
            .limit(batch_size)
            .all(db)
            .await?;
        after_id = match expired.last() {
            Some(last) => last.id,
            None => break,
        };

        for reward in expired.iter() {
            let uow = UnitOfWork::begin(db).await?;
            match sweep_reward(uow.conn(), reward, now).await {
                Ok(reclaimed) => {
                    uow.commit().await?;
                    if let Some(reclaimed) = reclaimed {
                        report.swept += 1;
                        report.reclaimed += reclaimed;
                    }
                }
                Err(error) => {
                    warn!("Skipping expired reward {}: {}", reward.id, error);
                    if let Err(error) = uow.rollback().await {
                        warn!("Rollback of reward {} failed: {}", reward.id, error);
                    }
                    report.failed += 1;
                }
            }
        }
        if (expired.len() as u64) < batch_size {
            break;
        }
    }
    if report.swept > 0 || report.failed > 0 {
        info!(
            "Expiry sweep: {} swept, {} failed, {} reclaimed",
            report.swept, report.failed, report.reclaimed
        );
    }
    Ok(report)
}

pub struct ExpirySweeper {
    db: DatabaseConnection,
    interval: Duration,
    batch_size: u64,
}

impl ExpirySweeper {
    pub fn new(db: DatabaseConnection, interval: Duration, batch_size: u64) -> ExpirySweeper {
        ExpirySweeper {
            db,
            interval,
            batch_size,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        info!("Expiry sweeper started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Utc::now().timestamp();
                    if let Err(error) = sweep_expired_rewards(&self.db, now, self.batch_size).await {
                        warn!("Expiry sweep failed: {}", error);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Expiry sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::{grant, reward_expiry};
    use crate::test_utils::*;
    use som_db_entity::db::sea_orm_active_enums::RewardType;

    #[tokio::test]
    async fn test_sweep_applies_once() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "lena", Decimal::from(100)).await;
        let reward = grant(&db, &wallet, Decimal::from(5), RewardType::AttendanceStreak, None, NOW)
            .await
            .unwrap();
        let after_expiry = reward_expiry(NOW) + 1;

        assert_eq!(sweep_expired_rewards(&db, NOW, 100).await.unwrap().swept, 0);

        let report = sweep_expired_rewards(&db, after_expiry, 100).await.unwrap();
        assert_eq!(report.swept, 1);
        assert_close(report.reclaimed, Decimal::from(5));
        let second = sweep_expired_rewards(&db, after_expiry + 300, 100).await.unwrap();
        assert_eq!(second, SweepReport::default());

        let wallet = ledger::find_wallet(&db, wallet.id).await.unwrap();
        assert_close(wallet.balance, Decimal::from(100));
        assert_close(wallet.total_som_expired, Decimal::from(5));
        let reward = Reward::find_by_id(reward.id).one(&db).await.unwrap().unwrap();
        assert_eq!(reward.swept_at, Some(after_expiry));
        assert_close(reward.reclaimed_amount.unwrap(), Decimal::from(5));
    }

    #[tokio::test]
    async fn test_sweep_clamps_at_zero() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "mike", Decimal::ZERO).await;
        grant(&db, &wallet, Decimal::from(10), RewardType::SurveyParticipation, None, NOW)
            .await
            .unwrap();
        ledger::debit(&db, wallet.id, Decimal::from(7)).await.unwrap();

        let report = sweep_expired_rewards(&db, reward_expiry(NOW) + 1, 100).await.unwrap();
        assert_eq!(report.swept, 1);
        assert_close(report.reclaimed, Decimal::from(3));

        let wallet = ledger::find_wallet(&db, wallet.id).await.unwrap();
        assert_close(wallet.balance, Decimal::ZERO);
        assert_close(wallet.total_som_expired, Decimal::from(3));
    }

    #[tokio::test]
    async fn test_sweep_pages_through_every_reward() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "paul", Decimal::from(50)).await;
        for _ in 0..5 {
            grant(&db, &wallet, Decimal::ONE, RewardType::AttendanceStreak, None, NOW)
                .await
                .unwrap();
        }

        let report = sweep_expired_rewards(&db, reward_expiry(NOW) + 1, 2).await.unwrap();
        assert_eq!(report.swept, 5);
        assert_close(report.reclaimed, Decimal::from(5));
        let unswept = Reward::find()
            .filter(RewardColumn::SweptAt.is_null())
            .all(&db)
            .await
            .unwrap();
        assert!(unswept.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_skips_broken_reward() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "nina", Decimal::ZERO).await;
        grant(&db, &wallet, Decimal::from(2), RewardType::InfoCompletion, None, NOW)
            .await
            .unwrap();
        let orphan = seed_user(&db, "olga", Decimal::ZERO).await;
        grant(&db, &orphan, Decimal::from(4), RewardType::InfoCompletion, None, NOW)
            .await
            .unwrap();
        som_db_entity::db::wallet::Entity::delete_by_id(orphan.id)
            .exec(&db)
            .await
            .unwrap();

        let report = sweep_expired_rewards(&db, reward_expiry(NOW) + 1, 100).await.unwrap();
        assert_eq!(report.swept, 1);
        assert_eq!(report.failed, 1);
        let unswept = Reward::find()
            .filter(RewardColumn::SweptAt.is_null())
            .all(&db)
            .await
            .unwrap();
        assert_eq!(unswept.len(), 1);
        assert_eq!(unswept[0].wallet_id, orphan.id);
    }
}
