pub mod attendance;
pub mod cart_item;
pub mod item;
pub mod job;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod pending_profit;
pub mod profit_payment;
pub mod reward;
pub mod sea_orm_active_enums;
pub mod sot;
pub mod survey;
pub mod survey_participant;
pub mod survey_sot;
pub mod user;
pub mod user_item;
pub mod user_respect_policy;
pub mod wallet;
pub mod wallet_recharge;
