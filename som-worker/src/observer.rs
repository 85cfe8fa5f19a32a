use crate::{datadog, slack};
use async_trait::async_trait;
use som_db_entity::db::job::Model as JobModel;
use som_settlement::scheduler::{JobObserver, JobOutcome, LoggingObserver};
use std::time::SystemTime;
use tracing::warn;

pub struct SlackTarget {
    pub webhook_url: String,
    pub channel_id: String,
}

/// Logs every job outcome, traces it to Datadog and alerts Slack when a job
/// is dropped after its last attempt.
pub struct WorkerObserver {
    client: reqwest::Client,
    datadog_client: Option<datadog_apm::Client>,
    slack: Option<SlackTarget>,
}

impl WorkerObserver {
    pub fn new(
        client: reqwest::Client,
        datadog_client: Option<datadog_apm::Client>,
        slack: Option<SlackTarget>,
    ) -> WorkerObserver {
        WorkerObserver {
            client,
            datadog_client,
            slack,
        }
    }
}

pub fn exhausted_alert(job: &JobModel, attempts: i32, error: &str) -> String {
    format!(
        "Job {} {} dropped after {} attempts \nPayload: {} \nLast error: {}",
        job.id, job.kind, attempts, job.payload, error
    )
}

#[async_trait]
impl JobObserver for WorkerObserver {
    async fn observe(&self, job: &JobModel, outcome: &JobOutcome, started_at: SystemTime) {
        LoggingObserver.observe(job, outcome, started_at).await;

        let error = match outcome {
            JobOutcome::Completed => None,
            JobOutcome::Retrying { error, .. } => {
                Some(datadog::job_error("retrying", error.to_owned()))
            }
            JobOutcome::Exhausted { error, .. } => {
                Some(datadog::job_error("exhausted", error.to_owned()))
            }
        };
        datadog::send_job_trace(
            self.datadog_client.as_ref(),
            &job.kind,
            job.id,
            started_at,
            error,
        );

        if let (JobOutcome::Exhausted { attempts, error }, Some(slack)) = (outcome, &self.slack) {
            let text = exhausted_alert(job, *attempts, error);
            if let Err(error) =
                slack::post_alert(&self.client, &slack.webhook_url, &slack.channel_id, text).await
            {
                warn!("Slack alert for job {} failed: {}", job.id, error);
            }
        }
    }
}
