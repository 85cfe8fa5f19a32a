use crate::bonus;
use crate::config::Config;
use crate::distribution::DistributionReport;
use crate::error::SettlementResult;
use crate::expiry::{self, SweepReport};
use crate::gateway::PaymentGateway;
use crate::notification::{dispatch_after_commit, PushSender};
use crate::participation::{self, ParticipationOutcome};
use crate::payment::{self, CheckoutReceipt, RechargeReceipt, RechargeRequest, SurveyFeeReceipt};
use crate::profit;
use crate::scheduler;
use crate::streak::{self, MarkOutcome};
use crate::unit_of_work::UnitOfWork;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use som_db_entity::db::profit_payment::Model as ProfitPaymentModel;
use som_db_entity::db::reward::Model as RewardModel;
use som_db_entity::db::sea_orm_active_enums::AttendanceKind;
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point of the settlement core. Every operation runs in its own unit of
/// work, which commits on success and rolls back on any error; notifications
/// saved on the way are pushed only after the commit.
#[derive(Clone)]
pub struct Settlement {
    db: DatabaseConnection,
    config: Arc<Config>,
    push: Arc<dyn PushSender>,
    gateway: Arc<dyn PaymentGateway>,
}

impl Settlement {
    pub fn new(
        db: DatabaseConnection,
        config: Arc<Config>,
        push: Arc<dyn PushSender>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Settlement {
        Settlement {
            db,
            config,
            push,
            gateway,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn finish<T>(&self, uow: UnitOfWork, result: SettlementResult<T>) -> SettlementResult<T> {
        match result {
            Ok(value) => {
                let outbox = uow.commit().await?;
                dispatch_after_commit(self.push.clone(), outbox);
                Ok(value)
            }
            Err(error) => {
                if error.is_precondition() {
                    info!("Rejected [{}]: {}", error.code(), error);
                } else {
                    warn!("Rolling back after [{}]: {}", error.code(), error);
                }
                if let Err(rollback_error) = uow.rollback().await {
                    warn!("Rollback failed after {}: {}", error, rollback_error);
                }
                Err(error)
            }
        }
    }

    pub async fn pay_survey_fee(
        &self,
        survey_id: i32,
        user_id: i32,
        now: i64,
    ) -> SettlementResult<SurveyFeeReceipt> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        let result = payment::pay_survey_fee(&mut uow, &self.config, survey_id, user_id, now).await;
        self.finish(uow, result).await
    }

    pub async fn checkout(
        &self,
        user_id: i32,
        cart_item_ids: &[i32],
        now: i64,
    ) -> SettlementResult<CheckoutReceipt> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        let result = payment::checkout(&mut uow, user_id, cart_item_ids, now).await;
        self.finish(uow, result).await
    }

    pub async fn recharge(
        &self,
        user_id: i32,
        request: &RechargeRequest,
        now: i64,
    ) -> SettlementResult<RechargeReceipt> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        let result =
            payment::recharge(&mut uow, self.gateway.as_ref(), user_id, request, now).await;
        self.finish(uow, result).await
    }

    pub async fn mark_attendance(&self, user_id: i32, now: i64) -> SettlementResult<MarkOutcome> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        let result = streak::mark(&mut uow, user_id, AttendanceKind::Attendance, now).await;
        self.finish(uow, result).await
    }

    pub async fn participate(
        &self,
        survey_id: i32,
        user_id: i32,
        option_id: i32,
        now: i64,
    ) -> SettlementResult<ParticipationOutcome> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        let result = participation::participate(&mut uow, survey_id, user_id, option_id, now).await;
        self.finish(uow, result).await
    }

    pub async fn grant_info_completion_bonus(
        &self,
        user_id: i32,
        now: i64,
    ) -> SettlementResult<RewardModel> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        let result = bonus::grant_info_completion_bonus(&mut uow, user_id, now).await;
        self.finish(uow, result).await
    }

    pub async fn start_survey(&self, survey_id: i32) -> SettlementResult<bool> {
        scheduler::start_survey(&self.db, survey_id).await
    }

    pub async fn end_survey(
        &self,
        survey_id: i32,
        now: i64,
    ) -> SettlementResult<Option<DistributionReport>> {
        let mut uow = UnitOfWork::begin(&self.db).await?;
        let result = scheduler::end_survey(&mut uow, survey_id, now).await;
        self.finish(uow, result).await
    }

    pub async fn settle_pending_profits(
        &self,
        owner_address: &str,
        transaction_ref: &str,
        now: i64,
    ) -> SettlementResult<Option<ProfitPaymentModel>> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result =
            profit::settle_pending_profits(uow.conn(), owner_address, transaction_ref, now).await;
        self.finish(uow, result).await
    }

    pub async fn pending_profit_summary(&self, owner_address: &str) -> SettlementResult<Decimal> {
        profit::pending_profit_total(&self.db, owner_address).await
    }

    pub async fn sweep_expired_rewards(&self, now: i64) -> SettlementResult<SweepReport> {
        let batch_size = self.config.expiry_sweep_batch_size();
        expiry::sweep_expired_rewards(&self.db, now, batch_size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_only_committed_work_is_pushed() {
        let (settlement, push) = setup_settlement().await;
        let db = settlement.db();
        let wallet = seed_user(db, "rita", Decimal::ZERO).await;

        settlement.mark_attendance(wallet.user_id, NOW).await.unwrap();
        let error = settlement
            .mark_attendance(wallet.user_id, NOW + 10)
            .await
            .unwrap_err();
        assert_eq!(error.code(), "ATTENDANCE_ALREADY_MARKED");
        assert!(error.is_precondition());

        settlement
            .grant_info_completion_bonus(wallet.user_id, NOW)
            .await
            .unwrap();
        assert!(settlement
            .grant_info_completion_bonus(wallet.user_id, NOW)
            .await
            .is_err());
        push.wait_for(1).await;
        assert_eq!(push.user_ids(), vec![wallet.user_id]);
    }

    #[tokio::test]
    async fn test_profit_settlement_through_service() {
        let (settlement, _) = setup_settlement().await;
        let db = settlement.db();
        let payer = seed_user(db, "sam", Decimal::from(1000)).await;
        let survey = seed_survey(db, payer.user_id, Decimal::from(2), 5, NOW, NOW + 86_400).await;
        seed_sot(db, survey.id, "owner-a").await;
        let receipt = settlement
            .pay_survey_fee(survey.id, payer.user_id, NOW)
            .await
            .unwrap();

        // single SOT: half of the whole payment
        let owed = settlement.pending_profit_summary("owner-a").await.unwrap();
        assert_close(owed, receipt.fee.total / Decimal::TWO);
        let payment = settlement
            .settle_pending_profits("owner-a", "sig", NOW)
            .await
            .unwrap()
            .unwrap();
        assert_close(payment.amount_in_som, owed);
        assert_close(
            settlement.pending_profit_summary("owner-a").await.unwrap(),
            Decimal::ZERO,
        );
    }

    #[tokio::test]
    async fn test_recharge_and_checkout_through_service() {
        let (settlement, _) = setup_settlement().await;
        let db = settlement.db();
        let wallet = seed_user(db, "tom", Decimal::ZERO).await;
        let item = seed_item(db, "mug", Decimal::from(25)).await;
        let line = seed_cart_item(db, wallet.user_id, item.id, 2).await;

        let error = settlement
            .checkout(wallet.user_id, &[line.id], NOW)
            .await
            .unwrap_err();
        assert_eq!(error.code(), "BALANCE_LESS_THAN_REQUIRED");

        let request = RechargeRequest {
            usd_amount: Decimal::from(5),
            payment_key: "pk".to_owned(),
            order_id: "o-1".to_owned(),
            usd_to_local_rate: Decimal::ONE,
            recharge_type: "card".to_owned(),
        };
        settlement.recharge(wallet.user_id, &request, NOW).await.unwrap();
        settlement.checkout(wallet.user_id, &[line.id], NOW).await.unwrap();

        let wallet = crate::ledger::find_wallet(db, wallet.id).await.unwrap();
        assert_close(wallet.balance, Decimal::ZERO);
        assert_close(wallet.total_recharged, Decimal::from(50));
        assert_close(wallet.total_sent, Decimal::from(50));
    }
}
