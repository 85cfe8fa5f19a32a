use crate::error::{SettlementError, SettlementResult};
use crate::ledger;
use crate::notification::{save_notifications, INFO_COMPLETION_REWARD};
use crate::reward;
use crate::unit_of_work::UnitOfWork;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use som_db_entity::db::reward::Model as RewardModel;
use som_db_entity::db::sea_orm_active_enums::RewardType;
use som_db_entity::db::user::{Column as UserColumn, Entity as User};

pub const INFO_COMPLETION_BONUS: i64 = 10;

/// One-time reward for completing the profile.
pub async fn grant_info_completion_bonus(
    uow: &mut UnitOfWork,
    user_id: i32,
    now: i64,
) -> SettlementResult<RewardModel> {
    let claimed = User::update_many()
        .col_expr(UserColumn::InfoCompletedRewarded, Expr::value(true))
        .filter(UserColumn::Id.eq(user_id))
        .filter(UserColumn::InfoCompletedRewarded.eq(false))
        .exec(uow.conn())
        .await?;
    if claimed.rows_affected == 0 {
        return match User::find_by_id(user_id).one(uow.conn()).await? {
            Some(_) => Err(SettlementError::InfoBonusAlreadyGranted(user_id)),
            None => Err(SettlementError::UserNotFound(user_id)),
        };
    }

    let amount = Decimal::from(INFO_COMPLETION_BONUS);
    let wallet = ledger::find_wallet_by_user(uow.conn(), user_id).await?;
    let reward = reward::grant(
        uow.conn(),
        &wallet,
        amount,
        RewardType::InfoCompletion,
        None,
        now,
    )
    .await?;
    let saved = save_notifications(
        uow.conn(),
        &[user_id],
        INFO_COMPLETION_REWARD,
        "Profile completed",
        &format!("You received {} SoM for completing your profile", amount),
        now,
    )
    .await?;
    uow.queue(saved);
    Ok(reward)
}
