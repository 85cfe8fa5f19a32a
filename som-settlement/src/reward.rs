use crate::error::SettlementResult;
use crate::ledger;
use chrono::{Months, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait};
use som_db_entity::db::reward::{ActiveModel as RewardActiveModel, Model as RewardModel};
use som_db_entity::db::sea_orm_active_enums::{RewardType, TransactionType};
use som_db_entity::db::wallet::Model as WalletModel;

pub const REWARD_LIFETIME_MONTHS: u32 = 3;
const SECONDS_PER_DAY: i64 = 86_400;

/// Expiry of a reward granted at `now`: the same time of day three calendar
/// months later.
pub fn reward_expiry(now: i64) -> i64 {
    Utc.timestamp_opt(now, 0)
        .single()
        .and_then(|granted_at| granted_at.checked_add_months(Months::new(REWARD_LIFETIME_MONTHS)))
        .map(|expiry| expiry.timestamp())
        .unwrap_or(now + 90 * SECONDS_PER_DAY)
}

/// Credits `amount` and persists the justifying reward row.
pub async fn grant<C>(
    conn: &C,
    wallet: &WalletModel,
    amount: Decimal,
    reward_type: RewardType,
    survey_id: Option<i32>,
    now: i64,
) -> SettlementResult<RewardModel>
where
    C: ConnectionTrait,
{
    ledger::credit(conn, wallet.id, amount).await?;
    let reward = RewardActiveModel {
        wallet_id: ActiveValue::Set(wallet.id),
        user_id: ActiveValue::Set(wallet.user_id),
        amount: ActiveValue::Set(amount),
        reward_type: ActiveValue::Set(reward_type),
        transaction_type: ActiveValue::Set(TransactionType::Inbound),
        expired_at: ActiveValue::Set(reward_expiry(now)),
        survey_id: ActiveValue::Set(survey_id),
        admin_id: ActiveValue::Set(None),
        swept_at: ActiveValue::Set(None),
        reclaimed_amount: ActiveValue::Set(None),
        created_at: ActiveValue::Set(now),
        ..Default::default()
    };
    Ok(reward.insert(conn).await?)
}
