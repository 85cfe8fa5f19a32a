use rust_decimal::Decimal;
use sea_orm::DbErr;
use thiserror::Error;

pub type SettlementResult<T> = Result<T, SettlementError>;

/// Business errors surfaced to callers as a stable code plus a message.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Balance {balance} is less than required amount {required}")]
    BalanceLessThanRequired { balance: Decimal, required: Decimal },
    #[error("Fee for survey {0} is already paid")]
    PaymentAlreadyMade(i32),
    #[error("Survey {0} has already ended")]
    SurveyExpired(i32),
    #[error("Cart is empty")]
    CartIsEmpty,
    #[error("{kind} is already marked today for user {user_id}")]
    AttendanceAlreadyMarked { user_id: i32, kind: &'static str },
    #[error("Survey {0} not found")]
    SurveyNotFound(i32),
    #[error("User {0} not found")]
    UserNotFound(i32),
    #[error("Wallet not found for {0}")]
    WalletNotFound(String),
    #[error("Survey {0} has no SOT")]
    SotNotFound(i32),
    #[error("Survey {0} is not ongoing")]
    SurveyNotOngoing(i32),
    #[error("User {user_id} already participated in survey {survey_id}")]
    AlreadyParticipated { survey_id: i32, user_id: i32 },
    #[error("Info completion bonus already granted to user {0}")]
    InfoBonusAlreadyGranted(i32),
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),
    #[error("Payment confirmation failed: {0}")]
    PaymentConfirmationFailed(String),
    #[error("Invalid job: {0}")]
    InvalidJob(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl SettlementError {
    pub fn code(&self) -> &'static str {
        match self {
            SettlementError::BalanceLessThanRequired { .. } => "BALANCE_LESS_THAN_REQUIRED",
            SettlementError::PaymentAlreadyMade(_) => "PAYMENT_ALREADY_MAKE",
            SettlementError::SurveyExpired(_) => "SURVEY_EXPIRED",
            SettlementError::CartIsEmpty => "CART_IS_EMPTY",
            SettlementError::AttendanceAlreadyMarked { .. } => "ATTENDANCE_ALREADY_MARKED",
            SettlementError::SurveyNotFound(_) => "SURVEY_NOT_FOUND",
            SettlementError::UserNotFound(_) => "USER_NOT_FOUND",
            SettlementError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            SettlementError::SotNotFound(_) => "SOT_NOT_FOUND",
            SettlementError::SurveyNotOngoing(_) => "SURVEY_NOT_ONGOING",
            SettlementError::AlreadyParticipated { .. } => "ALREADY_PARTICIPATED",
            SettlementError::InfoBonusAlreadyGranted(_) => "INFO_BONUS_ALREADY_GRANTED",
            SettlementError::InvalidAmount(_) => "INVALID_AMOUNT",
            SettlementError::PaymentConfirmationFailed(_) => "PAYMENT_CONFIRMATION_FAILED",
            SettlementError::InvalidJob(_) => "INVALID_JOB",
            SettlementError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Precondition failures are rejected before anything is written.
    pub fn is_precondition(&self) -> bool {
        !matches!(
            self,
            SettlementError::Database(_)
                | SettlementError::PaymentConfirmationFailed(_)
                | SettlementError::InvalidJob(_)
        )
    }
}
