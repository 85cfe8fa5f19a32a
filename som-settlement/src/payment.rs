use crate::config::Config;
use crate::error::{SettlementError, SettlementResult};
use crate::fin_cal::{survey_fee, usd_to_local, usd_to_som, FeeBreakdown};
use crate::gateway::PaymentGateway;
use crate::ledger;
use crate::profit::{load_survey_sots, record_pending_profits};
use crate::respect::{award_points, PURCHASE_POINTS, RECHARGE_POINTS};
use crate::scheduler::schedule_survey_jobs;
use crate::unit_of_work::UnitOfWork;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use som_db_entity::db::cart_item::{Column as CartItemColumn, Entity as CartItem};
use som_db_entity::db::item::Entity as Item;
use som_db_entity::db::job::Model as JobModel;
use som_db_entity::db::order::{ActiveModel as OrderActiveModel, Model as OrderModel};
use som_db_entity::db::order_item::{
    ActiveModel as OrderItemActiveModel, Model as OrderItemModel,
};
use som_db_entity::db::payment::{ActiveModel as PaymentActiveModel, Model as PaymentModel};
use som_db_entity::db::pending_profit::Model as PendingProfitModel;
use som_db_entity::db::sea_orm_active_enums::{
    PaymentStatus, PaymentType, SurveyStatus, TransactionType,
};
use som_db_entity::db::survey::{Column as SurveyColumn, Entity as Survey};
use som_db_entity::db::user_item::ActiveModel as UserItemActiveModel;
use som_db_entity::db::wallet_recharge::{
    ActiveModel as WalletRechargeActiveModel, Model as WalletRechargeModel,
};
use tracing::info;

#[derive(Clone, Debug)]
pub struct SurveyFeeReceipt {
    pub payment: PaymentModel,
    pub fee: FeeBreakdown,
    pub pending_profits: Vec<PendingProfitModel>,
    pub jobs: Vec<JobModel>,
}

#[derive(Clone, Debug)]
pub struct CheckoutReceipt {
    pub order: OrderModel,
    pub order_items: Vec<OrderItemModel>,
    pub payment: PaymentModel,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RechargeRequest {
    pub usd_amount: Decimal,
    pub payment_key: String,
    pub order_id: String,
    pub usd_to_local_rate: Decimal,
    pub recharge_type: String,
}

#[derive(Clone, Debug)]
pub struct RechargeReceipt {
    pub payment: PaymentModel,
    pub recharge: WalletRechargeModel,
    pub amount_in_som: Decimal,
}

#[allow(clippy::too_many_arguments)]
async fn insert_payment<C>(
    conn: &C,
    wallet_id: i32,
    amount: Decimal,
    payment_type: PaymentType,
    transaction_type: TransactionType,
    survey_id: Option<i32>,
    order_id: Option<i32>,
    now: i64,
) -> SettlementResult<PaymentModel>
where
    C: ConnectionTrait,
{
    let payment = PaymentActiveModel {
        wallet_id: ActiveValue::Set(wallet_id),
        amount: ActiveValue::Set(amount),
        payment_type: ActiveValue::Set(payment_type),
        payment_status: ActiveValue::Set(PaymentStatus::Completed),
        transaction_type: ActiveValue::Set(transaction_type),
        expired_at: ActiveValue::Set(None),
        survey_id: ActiveValue::Set(survey_id),
        order_id: ActiveValue::Set(order_id),
        created_at: ActiveValue::Set(now),
        ..Default::default()
    };
    Ok(payment.insert(conn).await?)
}

/// Charges the survey fee to `user_id`, credits the platform, enables the
/// survey, owes SOT owners their share and schedules the start and end jobs.
pub async fn pay_survey_fee(
    uow: &mut UnitOfWork,
    config: &Config,
    survey_id: i32,
    user_id: i32,
    now: i64,
) -> SettlementResult<SurveyFeeReceipt> {
    let conn = uow.conn();
    let survey = Survey::find_by_id(survey_id)
        .one(conn)
        .await?
        .ok_or(SettlementError::SurveyNotFound(survey_id))?;
    if survey.fee_paid {
        return Err(SettlementError::PaymentAlreadyMade(survey_id));
    }
    if survey.ending_date <= now {
        return Err(SettlementError::SurveyExpired(survey_id));
    }
    let sots = load_survey_sots(conn, survey_id).await?;
    if sots.is_empty() {
        return Err(SettlementError::SotNotFound(survey_id));
    }

    let fee = survey_fee(
        &config.fee_schedule(),
        survey.reward_amount,
        survey.rewardees_count,
        survey.starting_date,
        survey.ending_date,
        sots.len() as u64,
    );
    let wallet = ledger::find_wallet_by_user(conn, user_id).await?;
    let platform_wallet = ledger::find_wallet_by_user(conn, config.platform_user_id).await?;
    if wallet.balance < fee.total {
        return Err(SettlementError::BalanceLessThanRequired {
            balance: wallet.balance,
            required: fee.total,
        });
    }

    let payment = insert_payment(
        conn,
        wallet.id,
        fee.total,
        PaymentType::Survey,
        TransactionType::Outbound,
        Some(survey_id),
        None,
        now,
    )
    .await?;
    ledger::try_debit(conn, wallet.id, fee.total).await?;
    ledger::credit(conn, platform_wallet.id, fee.total).await?;

    let flipped = Survey::update_many()
        .col_expr(SurveyColumn::FeePaid, Expr::value(true))
        .col_expr(SurveyColumn::Status, Expr::value(SurveyStatus::Enabled))
        .filter(SurveyColumn::Id.eq(survey_id))
        .filter(SurveyColumn::FeePaid.eq(false))
        .exec(conn)
        .await?;
    if flipped.rows_affected == 0 {
        return Err(SettlementError::PaymentAlreadyMade(survey_id));
    }

    let pending_profits = record_pending_profits(
        conn,
        survey_id,
        &sots,
        fee.total,
        &config.platform_owner_address,
        now,
    )
    .await?;
    let jobs = schedule_survey_jobs(conn, &survey, now).await?;
    info!(
        "Survey {} fee {} paid by user {} (payment {})",
        survey_id, fee.total, user_id, payment.id
    );

    Ok(SurveyFeeReceipt {
        payment,
        fee,
        pending_profits,
        jobs,
    })
}

/// Buys the given cart entries of a user with SoM.
pub async fn checkout(
    uow: &mut UnitOfWork,
    user_id: i32,
    cart_item_ids: &[i32],
    now: i64,
) -> SettlementResult<CheckoutReceipt> {
    let conn = uow.conn();
    let cart = if cart_item_ids.is_empty() {
        Vec::new()
    } else {
        CartItem::find()
            .filter(CartItemColumn::UserId.eq(user_id))
            .filter(CartItemColumn::Id.is_in(cart_item_ids.to_vec()))
            .order_by_asc(CartItemColumn::Id)
            .find_also_related(Item)
            .all(conn)
            .await?
    };
    let lines: Vec<_> = cart
        .into_iter()
        .filter_map(|(cart_item, item)| item.map(|item| (cart_item, item)))
        .collect();
    if lines.is_empty() {
        return Err(SettlementError::CartIsEmpty);
    }

    let total: Decimal = lines
        .iter()
        .map(|(cart_item, item)| item.price * Decimal::from(cart_item.quantity))
        .sum();
    let wallet = ledger::find_wallet_by_user(conn, user_id).await?;
    if wallet.balance < total {
        return Err(SettlementError::BalanceLessThanRequired {
            balance: wallet.balance,
            required: total,
        });
    }

    let order = OrderActiveModel {
        user_id: ActiveValue::Set(user_id),
        total_amount: ActiveValue::Set(total),
        created_at: ActiveValue::Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    let mut order_items = Vec::with_capacity(lines.len());
    for (cart_item, item) in lines.iter() {
        let order_item = OrderItemActiveModel {
            order_id: ActiveValue::Set(order.id),
            item_id: ActiveValue::Set(item.id),
            quantity: ActiveValue::Set(cart_item.quantity),
            unit_price: ActiveValue::Set(item.price),
            ..Default::default()
        };
        order_items.push(order_item.insert(conn).await?);
    }

    let payment = insert_payment(
        conn,
        wallet.id,
        total,
        PaymentType::Purchase,
        TransactionType::Outbound,
        None,
        Some(order.id),
        now,
    )
    .await?;
    ledger::try_debit(conn, wallet.id, total).await?;

    CartItem::delete_many()
        .filter(CartItemColumn::Id.is_in(lines.iter().map(|(cart_item, _)| cart_item.id)))
        .exec(conn)
        .await?;
    for (cart_item, item) in lines.iter() {
        UserItemActiveModel {
            user_id: ActiveValue::Set(user_id),
            item_id: ActiveValue::Set(item.id),
            order_id: ActiveValue::Set(order.id),
            quantity: ActiveValue::Set(cart_item.quantity),
            acquired_at: ActiveValue::Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    award_points(conn, user_id, PURCHASE_POINTS).await?;
    info!("User {} checked out order {} for {}", user_id, order.id, total);

    Ok(CheckoutReceipt {
        order,
        order_items,
        payment,
    })
}

/// Credits a USD top-up. The gateway confirms before the caller commits, so
/// a rejected confirmation leaves nothing behind.
pub async fn recharge(
    uow: &mut UnitOfWork,
    gateway: &dyn PaymentGateway,
    user_id: i32,
    request: &RechargeRequest,
    now: i64,
) -> SettlementResult<RechargeReceipt> {
    if request.usd_amount <= Decimal::ZERO {
        return Err(SettlementError::InvalidAmount(request.usd_amount));
    }
    let conn = uow.conn();
    let wallet = ledger::find_wallet_by_user(conn, user_id).await?;

    let payment = insert_payment(
        conn,
        wallet.id,
        usd_to_som(request.usd_amount),
        PaymentType::Recharge,
        TransactionType::Inbound,
        None,
        None,
        now,
    )
    .await?;
    let amount_in_som = ledger::record_recharge(conn, wallet.id, request.usd_amount).await?;
    let recharge = WalletRechargeActiveModel {
        wallet_id: ActiveValue::Set(wallet.id),
        payment_id: ActiveValue::Set(payment.id),
        amount_in_usd: ActiveValue::Set(request.usd_amount),
        amount_in_som: ActiveValue::Set(amount_in_som),
        recharge_type: ActiveValue::Set(request.recharge_type.to_owned()),
        external_order_id: ActiveValue::Set(request.order_id.to_owned()),
        created_at: ActiveValue::Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    award_points(conn, user_id, RECHARGE_POINTS).await?;

    gateway
        .confirm(
            &request.payment_key,
            &request.order_id,
            usd_to_local(request.usd_amount, request.usd_to_local_rate),
        )
        .await?;
    info!(
        "User {} recharged {} USD as {} SoM",
        user_id, request.usd_amount, amount_in_som
    );

    Ok(RechargeReceipt {
        payment,
        recharge,
        amount_in_som,
    })
}
