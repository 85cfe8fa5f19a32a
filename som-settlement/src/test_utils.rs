use crate::config::Config;
use crate::error::{SettlementError, SettlementResult};
use crate::gateway::PaymentGateway;
use crate::notification::PushSender;
use crate::service::Settlement;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};
use som_db_entity::db::cart_item::{ActiveModel as CartItemActiveModel, Model as CartItemModel};
use som_db_entity::db::item::{ActiveModel as ItemActiveModel, Model as ItemModel};
use som_db_entity::db::notification::Model as NotificationModel;
use som_db_entity::db::sea_orm_active_enums::SurveyStatus;
use som_db_entity::db::sot::ActiveModel as SotActiveModel;
use som_db_entity::db::sot::Model as SotModel;
use som_db_entity::db::survey::{ActiveModel as SurveyActiveModel, Model as SurveyModel};
use som_db_entity::db::survey_participant::ActiveModel as ParticipantActiveModel;
use som_db_entity::db::survey_sot::ActiveModel as SurveySotActiveModel;
use som_db_entity::db::user::ActiveModel as UserActiveModel;
use som_db_entity::db::wallet::{ActiveModel as WalletActiveModel, Model as WalletModel};
use som_db_migration::{Migrator, MigratorTrait};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 2024-03-01T12:00:00Z
pub const NOW: i64 = 1_709_294_400;
pub const PLATFORM_ADDRESS: &str = "platform-operating-key";

/// In-memory SQLite database carrying the migrated schema, indexes included.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub fn test_config(platform_user_id: i32) -> Config {
    Config::for_tests(platform_user_id, PLATFORM_ADDRESS)
}

/// Creates a user with a wallet holding `balance`.
pub async fn seed_user(db: &DatabaseConnection, nickname: &str, balance: Decimal) -> WalletModel {
    let user = UserActiveModel {
        nickname: ActiveValue::Set(nickname.to_owned()),
        respect_level: ActiveValue::Set(1),
        respect_level_points: ActiveValue::Set(0),
        attendance_streak: ActiveValue::Set(0),
        participation_streak: ActiveValue::Set(0),
        info_completed_rewarded: ActiveValue::Set(false),
        created_at: ActiveValue::Set(NOW),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    WalletActiveModel {
        user_id: ActiveValue::Set(user.id),
        balance: ActiveValue::Set(balance),
        total_received: ActiveValue::Set(Decimal::ZERO),
        total_sent: ActiveValue::Set(Decimal::ZERO),
        total_recharged: ActiveValue::Set(Decimal::ZERO),
        total_som_expired: ActiveValue::Set(Decimal::ZERO),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_platform(db: &DatabaseConnection) -> WalletModel {
    seed_user(db, "platform", Decimal::ZERO).await
}

/// Unpaid, disabled survey.
pub async fn seed_survey(
    db: &DatabaseConnection,
    user_id: i32,
    reward_amount: Decimal,
    rewardees_count: i32,
    starting_date: i64,
    ending_date: i64,
) -> SurveyModel {
    SurveyActiveModel {
        user_id: ActiveValue::Set(user_id),
        title: ActiveValue::Set("Favourite colour".to_owned()),
        fee_paid: ActiveValue::Set(false),
        status: ActiveValue::Set(SurveyStatus::Disabled),
        reward_amount: ActiveValue::Set(reward_amount),
        rewardees_count: ActiveValue::Set(rewardees_count),
        starting_date: ActiveValue::Set(starting_date),
        ending_date: ActiveValue::Set(ending_date),
        rewards_distributed: ActiveValue::Set(false),
        created_at: ActiveValue::Set(NOW),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Paid survey running for one day from `NOW`.
pub async fn seed_survey_with_status(
    db: &DatabaseConnection,
    user_id: i32,
    status: SurveyStatus,
) -> SurveyModel {
    let survey = seed_survey(db, user_id, Decimal::ONE, 1, NOW, NOW + 86_400).await;
    let mut survey: SurveyActiveModel = survey.into();
    survey.fee_paid = ActiveValue::Set(true);
    survey.status = ActiveValue::Set(status);
    survey.update(db).await.unwrap()
}

pub async fn seed_sot(db: &DatabaseConnection, survey_id: i32, owner_address: &str) -> SotModel {
    let sot = SotActiveModel {
        name: ActiveValue::Set(format!("SOT of {}", owner_address)),
        owner_address: ActiveValue::Set(owner_address.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    SurveySotActiveModel {
        survey_id: ActiveValue::Set(survey_id),
        sot_id: ActiveValue::Set(sot.id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    sot
}

/// Adds `count` new users as participants and returns their ids, ascending.
pub async fn seed_participants(db: &DatabaseConnection, survey_id: i32, count: usize) -> Vec<i32> {
    let mut user_ids = Vec::with_capacity(count);
    for n in 0..count {
        let wallet = seed_user(db, &format!("participant-{}", n), Decimal::ZERO).await;
        ParticipantActiveModel {
            survey_id: ActiveValue::Set(survey_id),
            user_id: ActiveValue::Set(wallet.user_id),
            option_id: ActiveValue::Set((n % 3) as i32),
            created_at: ActiveValue::Set(NOW),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        user_ids.push(wallet.user_id);
    }
    user_ids
}

pub async fn seed_item(db: &DatabaseConnection, name: &str, price: Decimal) -> ItemModel {
    ItemActiveModel {
        name: ActiveValue::Set(name.to_owned()),
        price: ActiveValue::Set(price),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_cart_item(
    db: &DatabaseConnection,
    user_id: i32,
    item_id: i32,
    quantity: i32,
) -> CartItemModel {
    CartItemActiveModel {
        user_id: ActiveValue::Set(user_id),
        item_id: ActiveValue::Set(item_id),
        quantity: ActiveValue::Set(quantity),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// SQLite keeps decimals as REAL, so compare to five places.
pub fn assert_close(actual: Decimal, expected: Decimal) {
    assert!(
        (actual - expected).abs() < Decimal::new(1, 5),
        "{} != {}",
        actual,
        expected
    );
}

#[derive(Default)]
pub struct RecordingPushSender {
    fail: bool,
    sent: Mutex<Vec<NotificationModel>>,
}

impl RecordingPushSender {
    pub fn failing() -> Self {
        RecordingPushSender {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn user_ids(&self) -> Vec<i32> {
        self.sent.lock().unwrap().iter().map(|n| n.user_id).collect()
    }

    /// Waits for background dispatch to deliver `count` notifications.
    pub async fn wait_for(&self, count: usize) {
        for _ in 0..200 {
            if self.sent.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {} pushed notifications", count);
    }
}

#[async_trait]
impl PushSender for RecordingPushSender {
    async fn send(&self, notification: &NotificationModel) -> Result<(), String> {
        if self.fail {
            return Err("push node unavailable".to_owned());
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeGateway {
    reject: bool,
    calls: Mutex<Vec<(String, String, Decimal)>>,
}

impl FakeGateway {
    pub fn rejecting() -> Self {
        FakeGateway {
            reject: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String, Decimal)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn confirm(
        &self,
        payment_key: &str,
        order_id: &str,
        amount_in_local: Decimal,
    ) -> SettlementResult<()> {
        self.calls.lock().unwrap().push((
            payment_key.to_owned(),
            order_id.to_owned(),
            amount_in_local,
        ));
        if self.reject {
            return Err(SettlementError::PaymentConfirmationFailed(
                "card declined".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Settlement over a fresh database with the platform user already created.
pub async fn setup_settlement() -> (Settlement, Arc<RecordingPushSender>) {
    let db = setup_db().await;
    let platform = seed_platform(&db).await;
    let push = Arc::new(RecordingPushSender::default());
    let settlement = Settlement::new(
        db,
        Arc::new(test_config(platform.user_id)),
        push.clone(),
        Arc::new(FakeGateway::default()),
    );
    (settlement, push)
}
