use crate::error::{SettlementError, SettlementResult};
use crate::fin_cal::{owner_profit, profit_share};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder,
};
use som_db_entity::db::pending_profit::{
    ActiveModel as PendingProfitActiveModel, Column as PendingProfitColumn,
    Entity as PendingProfit, Model as PendingProfitModel,
};
use som_db_entity::db::profit_payment::{
    ActiveModel as ProfitPaymentActiveModel, Model as ProfitPaymentModel,
};
use som_db_entity::db::sea_orm_active_enums::ProfitStatus;
use som_db_entity::db::sot::{Entity as Sot, Model as SotModel};
use som_db_entity::db::survey_sot::{Column as SurveySotColumn, Entity as SurveySot};
use std::collections::HashSet;
use tracing::info;

/// Distinct SOTs hosting a survey, in link order. A SOT linked twice counts
/// once.
pub async fn load_survey_sots<C>(conn: &C, survey_id: i32) -> SettlementResult<Vec<SotModel>>
where
    C: ConnectionTrait,
{
    let links = SurveySot::find()
        .filter(SurveySotColumn::SurveyId.eq(survey_id))
        .order_by_asc(SurveySotColumn::Id)
        .find_also_related(Sot)
        .all(conn)
        .await?;
    let mut seen = HashSet::new();
    Ok(links
        .into_iter()
        .filter_map(|(_, sot)| sot)
        .filter(|sot| seen.insert(sot.id))
        .collect())
}

/// Splits `total` evenly over the survey's SOTs and owes half of each share to
/// every SOT owner other than the platform.
pub async fn record_pending_profits<C>(
    conn: &C,
    survey_id: i32,
    sots: &[SotModel],
    total: Decimal,
    platform_owner_address: &str,
    now: i64,
) -> SettlementResult<Vec<PendingProfitModel>>
where
    C: ConnectionTrait,
{
    if sots.is_empty() {
        return Err(SettlementError::SotNotFound(survey_id));
    }
    let share = profit_share(total, sots.len() as u64);
    let amount = owner_profit(share);

    let mut recorded = Vec::new();
    for sot in sots
        .iter()
        .filter(|sot| sot.owner_address != platform_owner_address)
    {
        let pending = PendingProfitActiveModel {
            sot_id: ActiveValue::Set(sot.id),
            survey_id: ActiveValue::Set(survey_id),
            owner_address: ActiveValue::Set(sot.owner_address.to_owned()),
            amount_in_som: ActiveValue::Set(amount),
            status: ActiveValue::Set(ProfitStatus::Pending),
            profit_payment_id: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            ..Default::default()
        };
        recorded.push(pending.insert(conn).await?);
    }
    info!(
        "Survey {}: {} pending profits of {} over {} SOTs",
        survey_id,
        recorded.len(),
        amount,
        sots.len()
    );
    Ok(recorded)
}

async fn pending_for_owner<C>(
    conn: &C,
    owner_address: &str,
) -> SettlementResult<Vec<PendingProfitModel>>
where
    C: ConnectionTrait,
{
    Ok(PendingProfit::find()
        .filter(PendingProfitColumn::OwnerAddress.eq(owner_address))
        .filter(PendingProfitColumn::Status.eq(ProfitStatus::Pending))
        .order_by_asc(PendingProfitColumn::Id)
        .all(conn)
        .await?)
}

pub async fn pending_profit_total<C>(conn: &C, owner_address: &str) -> SettlementResult<Decimal>
where
    C: ConnectionTrait,
{
    Ok(pending_for_owner(conn, owner_address)
        .await?
        .iter()
        .map(|pending| pending.amount_in_som)
        .sum())
}

/// Rolls every pending profit of an owner into one payment settled
/// out-of-band under `transaction_ref`.
pub async fn settle_pending_profits<C>(
    conn: &C,
    owner_address: &str,
    transaction_ref: &str,
    now: i64,
) -> SettlementResult<Option<ProfitPaymentModel>>
where
    C: ConnectionTrait,
{
    let pending = pending_for_owner(conn, owner_address).await?;
    if pending.is_empty() {
        return Ok(None);
    }
    let ids: Vec<i32> = pending.iter().map(|profit| profit.id).collect();
    let total: Decimal = pending.iter().map(|profit| profit.amount_in_som).sum();

    let payment = ProfitPaymentActiveModel {
        owner_address: ActiveValue::Set(owner_address.to_owned()),
        amount_in_som: ActiveValue::Set(total),
        transaction_ref: ActiveValue::Set(transaction_ref.to_owned()),
        created_at: ActiveValue::Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    PendingProfit::update_many()
        .col_expr(PendingProfitColumn::Status, Expr::value(ProfitStatus::Completed))
        .col_expr(PendingProfitColumn::ProfitPaymentId, Expr::value(Some(payment.id)))
        .filter(PendingProfitColumn::Id.is_in(ids))
        .filter(PendingProfitColumn::Status.eq(ProfitStatus::Pending))
        .exec(conn)
        .await?;
    info!(
        "Settled {} pending profits of {} as payment {}",
        pending.len(),
        owner_address,
        payment.id
    );
    Ok(Some(payment))
}
