use crate::dto::PushNotificationRequest;
use crate::error::SettlementResult;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait};
use som_db_entity::db::notification::{
    ActiveModel as NotificationActiveModel, Model as NotificationModel,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const SURVEY_REWARD: &str = "SURVEY_REWARD";
pub const SURVEY_RESULT: &str = "SURVEY_RESULT";
pub const STREAK_REWARD: &str = "STREAK_REWARD";
pub const INFO_COMPLETION_REWARD: &str = "INFO_COMPLETION_REWARD";

/// Persists one notification per user inside the caller's transaction.
pub async fn save_notifications<C>(
    conn: &C,
    user_ids: &[i32],
    kind: &str,
    title: &str,
    body: &str,
    now: i64,
) -> SettlementResult<Vec<NotificationModel>>
where
    C: ConnectionTrait,
{
    let mut saved = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        let notification = NotificationActiveModel {
            user_id: ActiveValue::Set(*user_id),
            kind: ActiveValue::Set(kind.to_owned()),
            title: ActiveValue::Set(title.to_owned()),
            body: ActiveValue::Set(body.to_owned()),
            is_read: ActiveValue::Set(false),
            created_at: ActiveValue::Set(now),
            ..Default::default()
        };
        saved.push(notification.insert(conn).await?);
    }
    Ok(saved)
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, notification: &NotificationModel) -> Result<(), String>;
}

pub struct HttpPushSender {
    client: reqwest::Client,
    notification_node: String,
}

impl HttpPushSender {
    pub fn new(client: reqwest::Client, notification_node: String) -> Self {
        HttpPushSender {
            client,
            notification_node,
        }
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, notification: &NotificationModel) -> Result<(), String> {
        let response = self
            .client
            .post(&self.notification_node)
            .json(&PushNotificationRequest::new(notification))
            .send()
            .await
            .map_err(|error| format!("Push request error: {}", error))?;
        if !response.status().is_success() {
            return Err(format!("Push rejected with code {}", response.status()));
        }
        Ok(())
    }
}

/// Delivers a committed outbox in the background. Failures are logged only.
pub fn dispatch_after_commit(
    push: Arc<dyn PushSender>,
    outbox: Vec<NotificationModel>,
) -> Option<JoinHandle<()>> {
    if outbox.is_empty() {
        return None;
    }
    Some(tokio::spawn(async move {
        for notification in outbox.iter() {
            match push.send(notification).await {
                Ok(()) => info!(
                    "Pushed {} notification {} to user {}",
                    notification.kind, notification.id, notification.user_id
                ),
                Err(error) => warn!(
                    "Push of notification {} failed: {}",
                    notification.id, error
                ),
            }
        }
    }))
}
