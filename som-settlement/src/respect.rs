use crate::error::{SettlementError, SettlementResult};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use som_db_entity::db::user::{Column as UserColumn, Entity as User, Model as UserModel};

pub const RECHARGE_POINTS: i32 = 3;
pub const PURCHASE_POINTS: i32 = 2;
pub const PARTICIPATION_POINTS: i32 = 1;
pub const NON_CONSECUTIVE_BONUS_POINTS: i32 = 10;

/// Upper bound (inclusive) of points for levels 1 to 6; above the last bound
/// is level 7.
const LEVEL_BOUNDS: [i32; 6] = [50, 150, 300, 475, 700, 950];

pub fn respect_level(points: i32) -> i32 {
    match LEVEL_BOUNDS.iter().position(|bound| points <= *bound) {
        Some(index) => index as i32 + 1,
        None => LEVEL_BOUNDS.len() as i32 + 1,
    }
}

/// Adds `points` and recomputes the level from the new total.
pub async fn award_points<C>(conn: &C, user_id: i32, points: i32) -> SettlementResult<UserModel>
where
    C: ConnectionTrait,
{
    let result = User::update_many()
        .col_expr(
            UserColumn::RespectLevelPoints,
            Expr::col(UserColumn::RespectLevelPoints).add(points),
        )
        .filter(UserColumn::Id.eq(user_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(SettlementError::UserNotFound(user_id));
    }

    let mut user = User::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(SettlementError::UserNotFound(user_id))?;
    let level = respect_level(user.respect_level_points);
    if level != user.respect_level {
        User::update_many()
            .col_expr(UserColumn::RespectLevel, Expr::value(level))
            .filter(UserColumn::Id.eq(user_id))
            .exec(conn)
            .await?;
        user.respect_level = level;
    }
    Ok(user)
}
