use crate::error::SettlementError;
use serde::{Deserialize, Serialize};
use som_db_entity::db::notification::Model as NotificationModel;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&SettlementError> for ErrorResponse {
    fn from(error: &SettlementError) -> Self {
        ErrorResponse {
            code: error.code().to_owned(),
            message: error.to_string(),
        }
    }
}

/// Payload of both survey jobs.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SurveyJobPayload {
    #[serde(rename = "surveyId")]
    pub survey_id: String,
}

impl SurveyJobPayload {
    pub fn new(survey_id: i32) -> SurveyJobPayload {
        SurveyJobPayload {
            survey_id: survey_id.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ConfirmPaymentRequest {
    #[serde(rename = "paymentKey")]
    pub payment_key: String,
    #[serde(rename = "orderId")]
    pub order_id: String,
    pub amount: String,
}

impl ConfirmPaymentRequest {
    pub fn new(payment_key: String, order_id: String, amount: String) -> Self {
        Self {
            payment_key,
            order_id,
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PushNotificationRequest {
    #[serde(rename = "type")]
    notification_type: String,
    payload: Payload,
}

impl PushNotificationRequest {
    pub fn new(notification: &NotificationModel) -> PushNotificationRequest {
        PushNotificationRequest {
            notification_type: notification.kind.to_owned(),
            payload: Payload {
                data: PushData {
                    receiver_user_id: notification.user_id.to_string(),
                    notification_id: notification.id,
                    title: notification.title.to_owned(),
                    body: notification.body.to_owned(),
                    mutable_content: 1,
                },
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
struct Payload {
    data: PushData,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
struct PushData {
    receiver_user_id: String,
    notification_id: i32,
    title: String,
    body: String,
    mutable_content: u8,
}
