use crate::error::{SettlementError, SettlementResult};
use crate::ledger;
use crate::notification::{save_notifications, STREAK_REWARD};
use crate::respect::{award_points, NON_CONSECUTIVE_BONUS_POINTS};
use crate::reward;
use crate::unit_of_work::UnitOfWork;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use som_db_entity::db::attendance::{
    ActiveModel as AttendanceActiveModel, Column as AttendanceColumn, Entity as Attendance,
};
use som_db_entity::db::reward::Model as RewardModel;
use som_db_entity::db::sea_orm_active_enums::{AttendanceKind, RewardType};
use som_db_entity::db::user::{Column as UserColumn, Entity as User};
use som_db_entity::db::user_respect_policy::{
    ActiveModel as PolicyActiveModel, Column as PolicyColumn, Entity as Policy,
    Model as PolicyModel,
};
use tracing::info;

pub const MAX_STREAK: i32 = 100;
pub const BONUS_THRESHOLD: u64 = 10;
pub const BONUS_WINDOW_DAYS: i64 = 60;

#[derive(Clone, Debug, PartialEq)]
pub struct MarkOutcome {
    pub kind: AttendanceKind,
    /// Value stored after this mark; 0 right after the top tier.
    pub streak: i32,
    pub points_awarded: i32,
    pub reward: Option<RewardModel>,
    pub bonus_granted: bool,
}

pub fn tier_points(streak: i32) -> i32 {
    match streak {
        10 => 5,
        30 => 10,
        40 => 15,
        60 => 20,
        70 => 25,
        90 => 30,
        100 => 50,
        _ => 0,
    }
}

pub fn tier_reward(kind: AttendanceKind, streak: i32) -> Option<Decimal> {
    let (attendance, participation) = match streak {
        10 => (3, 5),
        30 => (10, 50),
        100 => (50, 100),
        _ => return None,
    };
    Some(Decimal::from(match kind {
        AttendanceKind::Attendance => attendance,
        AttendanceKind::Participation => participation,
    }))
}

fn kind_name(kind: AttendanceKind) -> &'static str {
    match kind {
        AttendanceKind::Attendance => "Attendance",
        AttendanceKind::Participation => "Participation",
    }
}

pub fn utc_day(now: i64) -> NaiveDate {
    match Utc.timestamp_opt(now, 0).single() {
        Some(time) => time.date_naive(),
        None => NaiveDate::MIN,
    }
}

async fn is_marked<C>(
    conn: &C,
    user_id: i32,
    kind: AttendanceKind,
    day: NaiveDate,
) -> SettlementResult<bool>
where
    C: ConnectionTrait,
{
    let count = Attendance::find()
        .filter(AttendanceColumn::UserId.eq(user_id))
        .filter(AttendanceColumn::Kind.eq(kind))
        .filter(AttendanceColumn::MarkedOn.eq(day))
        .count(conn)
        .await?;
    Ok(count > 0)
}

pub async fn is_marked_today<C>(
    conn: &C,
    user_id: i32,
    kind: AttendanceKind,
    now: i64,
) -> SettlementResult<bool>
where
    C: ConnectionTrait,
{
    is_marked(conn, user_id, kind, utc_day(now)).await
}

async fn find_or_create_policy<C>(conn: &C, user_id: i32) -> SettlementResult<PolicyModel>
where
    C: ConnectionTrait,
{
    let policy = Policy::find()
        .filter(PolicyColumn::UserId.eq(user_id))
        .one(conn)
        .await?;
    match policy {
        Some(policy) => Ok(policy),
        None => {
            let policy = PolicyActiveModel {
                user_id: ActiveValue::Set(user_id),
                ten_attendance_expiry: ActiveValue::Set(None),
                ten_participation_expiry: ActiveValue::Set(None),
                ..Default::default()
            };
            Ok(policy.insert(conn).await?)
        }
    }
}

/// Grants the non-consecutive bonus when more than ten marks happened since
/// the previous grant and the previous window has closed.
async fn apply_non_consecutive_bonus<C>(
    conn: &C,
    user_id: i32,
    kind: AttendanceKind,
    now: i64,
) -> SettlementResult<bool>
where
    C: ConnectionTrait,
{
    let policy = find_or_create_policy(conn, user_id).await?;
    let (expiry, expiry_column) = match kind {
        AttendanceKind::Attendance => {
            (policy.ten_attendance_expiry, PolicyColumn::TenAttendanceExpiry)
        }
        AttendanceKind::Participation => (
            policy.ten_participation_expiry,
            PolicyColumn::TenParticipationExpiry,
        ),
    };
    if matches!(expiry, Some(expiry) if expiry > now) {
        return Ok(false);
    }

    let window = Duration::days(BONUS_WINDOW_DAYS).num_seconds();
    let mut marks = Attendance::find()
        .filter(AttendanceColumn::UserId.eq(user_id))
        .filter(AttendanceColumn::Kind.eq(kind));
    if let Some(expiry) = expiry {
        marks = marks.filter(AttendanceColumn::CreatedAt.gt(expiry - window));
    }
    if marks.count(conn).await? <= BONUS_THRESHOLD {
        return Ok(false);
    }

    award_points(conn, user_id, NON_CONSECUTIVE_BONUS_POINTS).await?;
    Policy::update_many()
        .col_expr(expiry_column, Expr::value(Some(now + window)))
        .filter(PolicyColumn::Id.eq(policy.id))
        .exec(conn)
        .await?;
    Ok(true)
}

/// Marks today's attendance or participation for a user and pays any tier
/// reached.
pub async fn mark(
    uow: &mut UnitOfWork,
    user_id: i32,
    kind: AttendanceKind,
    now: i64,
) -> SettlementResult<MarkOutcome> {
    let today = utc_day(now);
    if is_marked(uow.conn(), user_id, kind, today).await? {
        return Err(SettlementError::AttendanceAlreadyMarked {
            user_id,
            kind: kind_name(kind),
        });
    }
    let user = User::find_by_id(user_id)
        .one(uow.conn())
        .await?
        .ok_or(SettlementError::UserNotFound(user_id))?;

    let continued = is_marked(uow.conn(), user_id, kind, today - Duration::days(1)).await?;
    AttendanceActiveModel {
        user_id: ActiveValue::Set(user_id),
        kind: ActiveValue::Set(kind),
        marked_on: ActiveValue::Set(today),
        created_at: ActiveValue::Set(now),
        ..Default::default()
    }
    .insert(uow.conn())
    .await?;

    let (current, streak_column) = match kind {
        AttendanceKind::Attendance => (user.attendance_streak, UserColumn::AttendanceStreak),
        AttendanceKind::Participation => {
            (user.participation_streak, UserColumn::ParticipationStreak)
        }
    };
    let reached = if continued { current + 1 } else { 1 };
    let stored = if reached >= MAX_STREAK { 0 } else { reached };
    User::update_many()
        .col_expr(streak_column, Expr::value(stored))
        .filter(UserColumn::Id.eq(user_id))
        .exec(uow.conn())
        .await?;

    let points_awarded = tier_points(reached);
    if points_awarded > 0 {
        award_points(uow.conn(), user_id, points_awarded).await?;
    }

    let reward = match tier_reward(kind, reached) {
        Some(amount) => {
            let wallet = ledger::find_wallet_by_user(uow.conn(), user_id).await?;
            let reward_type = match kind {
                AttendanceKind::Attendance => RewardType::AttendanceStreak,
                AttendanceKind::Participation => RewardType::ParticipationStreak,
            };
            let reward =
                reward::grant(uow.conn(), &wallet, amount, reward_type, None, now).await?;
            let saved = save_notifications(
                uow.conn(),
                &[user_id],
                STREAK_REWARD,
                &format!("{} streak {}", kind_name(kind), reached),
                &format!("You received {} SoM for a {} day streak", amount, reached),
                now,
            )
            .await?;
            uow.queue(saved);
            info!(
                "User {} reached {} streak {}, rewarded {}",
                user_id,
                kind_name(kind),
                reached,
                amount
            );
            Some(reward)
        }
        None => None,
    };

    let bonus_granted = apply_non_consecutive_bonus(uow.conn(), user_id, kind, now).await?;

    Ok(MarkOutcome {
        kind,
        streak: stored,
        points_awarded,
        reward,
        bonus_granted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use som_db_entity::db::reward::Entity as Reward;
    use som_db_entity::db::user::Model as UserModel;

    const DAY: i64 = 86_400;

    async fn mark_on(db: &sea_orm::DatabaseConnection, user_id: i32, day: i64) -> MarkOutcome {
        mark_kind_on(db, user_id, AttendanceKind::Attendance, day).await
    }

    async fn mark_kind_on(
        db: &sea_orm::DatabaseConnection,
        user_id: i32,
        kind: AttendanceKind,
        day: i64,
    ) -> MarkOutcome {
        let mut uow = UnitOfWork::begin(db).await.unwrap();
        let outcome = mark(&mut uow, user_id, kind, NOW + day * DAY).await.unwrap();
        uow.commit().await.unwrap();
        outcome
    }

    async fn load_user(db: &sea_orm::DatabaseConnection, user_id: i32) -> UserModel {
        User::find_by_id(user_id).one(db).await.unwrap().unwrap()
    }

    #[test]
    fn test_tier_tables() {
        assert_eq!(tier_points(10), 5);
        assert_eq!(tier_points(40), 15);
        assert_eq!(tier_points(100), 50);
        assert_eq!(tier_points(11), 0);
        assert_eq!(tier_reward(AttendanceKind::Attendance, 10), Some(Decimal::from(3)));
        assert_eq!(tier_reward(AttendanceKind::Participation, 30), Some(Decimal::from(50)));
        assert_eq!(tier_reward(AttendanceKind::Participation, 100), Some(Decimal::from(100)));
        assert_eq!(tier_reward(AttendanceKind::Attendance, 40), None);
    }

    #[tokio::test]
    async fn test_second_mark_same_day_is_rejected() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "gina", Decimal::ZERO).await;
        mark_on(&db, wallet.user_id, 0).await;

        let mut uow = UnitOfWork::begin(&db).await.unwrap();
        let error = mark(&mut uow, wallet.user_id, AttendanceKind::Attendance, NOW + 60)
            .await
            .unwrap_err();
        uow.rollback().await.unwrap();
        assert_eq!(error.code(), "ATTENDANCE_ALREADY_MARKED");

        // the other kind has its own streak
        let outcome = mark_kind_on(&db, wallet.user_id, AttendanceKind::Participation, 0).await;
        assert_eq!(outcome.streak, 1);
    }

    #[tokio::test]
    async fn test_gap_resets_streak() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "hank", Decimal::ZERO).await;
        assert_eq!(mark_on(&db, wallet.user_id, 0).await.streak, 1);
        assert_eq!(mark_on(&db, wallet.user_id, 1).await.streak, 2);
        assert_eq!(mark_on(&db, wallet.user_id, 3).await.streak, 1);
        assert_eq!(load_user(&db, wallet.user_id).await.attendance_streak, 1);
    }

    #[tokio::test]
    async fn test_ten_consecutive_days_pay_one_reward() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "iris", Decimal::ZERO).await;
        let mut rewards = 0;
        for day in 0..10 {
            let outcome = mark_on(&db, wallet.user_id, day).await;
            if outcome.reward.is_some() {
                rewards += 1;
            }
            assert!(!outcome.bonus_granted);
        }
        assert_eq!(rewards, 1);

        let user = load_user(&db, wallet.user_id).await;
        assert_eq!(user.attendance_streak, 10);
        assert_eq!(user.respect_level_points, 5);

        let stored = Reward::find().all(&db).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].reward_type, RewardType::AttendanceStreak);
        assert_close(stored[0].amount, Decimal::from(3));
        let wallet = ledger::find_wallet(&db, wallet.id).await.unwrap();
        assert_close(wallet.balance, Decimal::from(3));
    }

    #[tokio::test]
    async fn test_streak_wraps_to_zero_at_top_tier() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "jack", Decimal::ZERO).await;
        AttendanceActiveModel {
            user_id: ActiveValue::Set(wallet.user_id),
            kind: ActiveValue::Set(AttendanceKind::Attendance),
            marked_on: ActiveValue::Set(utc_day(NOW - DAY)),
            created_at: ActiveValue::Set(NOW - DAY),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        User::update_many()
            .col_expr(UserColumn::AttendanceStreak, Expr::value(99))
            .filter(UserColumn::Id.eq(wallet.user_id))
            .exec(&db)
            .await
            .unwrap();

        let outcome = mark_on(&db, wallet.user_id, 0).await;
        assert_eq!(outcome.streak, 0);
        assert_eq!(outcome.points_awarded, 50);
        assert_close(outcome.reward.unwrap().amount, Decimal::from(50));

        assert_eq!(mark_on(&db, wallet.user_id, 1).await.streak, 1);
    }

    #[tokio::test]
    async fn test_non_consecutive_bonus_window() {
        let db = setup_db().await;
        let wallet = seed_user(&db, "kate", Decimal::ZERO).await;
        // every other day, so no streak tier is ever reached
        let mut granted = Vec::new();
        for n in 0..12 {
            let outcome = mark_on(&db, wallet.user_id, n * 2).await;
            assert_eq!(outcome.streak, 1);
            granted.push(outcome.bonus_granted);
        }
        assert_eq!(granted.iter().filter(|g| **g).count(), 1);
        assert!(granted[10]);
        assert_eq!(
            load_user(&db, wallet.user_id).await.respect_level_points,
            NON_CONSECUTIVE_BONUS_POINTS
        );

        let policy = Policy::find()
            .filter(PolicyColumn::UserId.eq(wallet.user_id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            policy.ten_attendance_expiry,
            Some(NOW + 20 * DAY + BONUS_WINDOW_DAYS * DAY)
        );
        assert!(policy.ten_participation_expiry.is_none());

        // after the window closes, marks made after the grant count again
        for n in 0..10 {
            let outcome = mark_on(&db, wallet.user_id, 90 + n * 2).await;
            assert_eq!(outcome.bonus_granted, n == 9);
        }
    }
}
