use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(crate = "serde")]
pub struct SlackNotificationData {
    pub channel: String,
    pub text: String,
}
