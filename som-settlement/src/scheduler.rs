//! Durable delayed jobs for survey state transitions.
//!
//! Jobs live in the `job` table. They are inserted in the unit of work that
//! pays the survey fee, claimed by [`JobRunner`] with a guarded
//! `pending -> running` update and deleted once they succeed.

use crate::distribution::{distribute_survey_rewards, DistributionReport};
use crate::dto::SurveyJobPayload;
use crate::error::{SettlementError, SettlementResult};
use crate::service::Settlement;
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use som_db_entity::db::job::{
    ActiveModel as JobActiveModel, Column as JobColumn, Entity as Job, Model as JobModel,
};
use som_db_entity::db::sea_orm_active_enums::{JobStatus, SurveyStatus};
use som_db_entity::db::survey::{Column as SurveyColumn, Entity as Survey, Model as SurveyModel};
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;
use strum_macros::{Display, EnumString};
use tokio::sync::watch;
use tracing::{error, info, warn};

pub const MAX_ATTEMPTS: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    StartSurvey,
    EndSurvey,
}

#[derive(Clone, Debug, PartialEq)]
pub enum JobOutcome {
    Completed,
    Retrying { attempts: i32, next_run_at: i64, error: String },
    Exhausted { attempts: i32, error: String },
}

/// Receives the outcome of every job the runner executes.
#[async_trait]
pub trait JobObserver: Send + Sync {
    async fn observe(&self, job: &JobModel, outcome: &JobOutcome, started_at: SystemTime);
}

pub struct LoggingObserver;

#[async_trait]
impl JobObserver for LoggingObserver {
    async fn observe(&self, job: &JobModel, outcome: &JobOutcome, _started_at: SystemTime) {
        match outcome {
            JobOutcome::Completed => info!("Job {} {} completed", job.id, job.kind),
            JobOutcome::Retrying { attempts, error, .. } => {
                warn!("Job {} {} attempt {} failed: {}", job.id, job.kind, attempts, error)
            }
            JobOutcome::Exhausted { attempts, error } => error!(
                "Job {} {} dropped after {} attempts: {}",
                job.id, job.kind, attempts, error
            ),
        }
    }
}

pub async fn enqueue<C>(
    conn: &C,
    kind: JobKind,
    payload: &SurveyJobPayload,
    run_at_millis: i64,
    now: i64,
) -> SettlementResult<JobModel>
where
    C: ConnectionTrait,
{
    let payload = serde_json::to_string(payload)
        .map_err(|error| SettlementError::InvalidJob(error.to_string()))?;
    let job = JobActiveModel {
        kind: ActiveValue::Set(kind.to_string()),
        payload: ActiveValue::Set(payload),
        run_at: ActiveValue::Set(run_at_millis),
        attempts: ActiveValue::Set(0),
        max_attempts: ActiveValue::Set(MAX_ATTEMPTS),
        status: ActiveValue::Set(JobStatus::Pending),
        last_error: ActiveValue::Set(None),
        locked_at: ActiveValue::Set(None),
        created_at: ActiveValue::Set(now),
        ..Default::default()
    };
    Ok(job.insert(conn).await?)
}

/// Millisecond delay until `timestamp`, never negative.
pub fn delay_millis(timestamp: i64, now: i64) -> i64 {
    (timestamp - now).max(0) * 1_000
}

pub async fn schedule_survey_jobs<C>(
    conn: &C,
    survey: &SurveyModel,
    now: i64,
) -> SettlementResult<Vec<JobModel>>
where
    C: ConnectionTrait,
{
    let payload = SurveyJobPayload::new(survey.id);
    let now_millis = now * 1_000;
    let start = enqueue(
        conn,
        JobKind::StartSurvey,
        &payload,
        now_millis + delay_millis(survey.starting_date, now),
        now,
    )
    .await?;
    let end = enqueue(
        conn,
        JobKind::EndSurvey,
        &payload,
        now_millis + delay_millis(survey.ending_date, now),
        now,
    )
    .await?;
    Ok(vec![start, end])
}

/// Moves a paid, enabled survey to `ongoing`. A stale or duplicate job
/// matches no row and changes nothing.
pub async fn start_survey<C>(conn: &C, survey_id: i32) -> SettlementResult<bool>
where
    C: ConnectionTrait,
{
    let result = Survey::update_many()
        .col_expr(SurveyColumn::Status, Expr::value(SurveyStatus::Ongoing))
        .filter(SurveyColumn::Id.eq(survey_id))
        .filter(SurveyColumn::FeePaid.eq(true))
        .filter(SurveyColumn::Status.eq(SurveyStatus::Enabled))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Ends a paid survey and distributes its rewards. Returns `None` for a survey
/// whose fee was never paid.
pub async fn end_survey(
    uow: &mut UnitOfWork,
    survey_id: i32,
    now: i64,
) -> SettlementResult<Option<DistributionReport>> {
    let survey = Survey::find_by_id(survey_id)
        .one(uow.conn())
        .await?
        .ok_or(SettlementError::SurveyNotFound(survey_id))?;
    if !survey.fee_paid {
        warn!("Survey {} ends without a paid fee", survey_id);
        return Ok(None);
    }
    Survey::update_many()
        .col_expr(SurveyColumn::Status, Expr::value(SurveyStatus::Ended))
        .filter(SurveyColumn::Id.eq(survey_id))
        .filter(SurveyColumn::FeePaid.eq(true))
        .exec(uow.conn())
        .await?;
    Ok(Some(distribute_survey_rewards(uow, &survey, now).await?))
}

fn parse_job(job: &JobModel) -> SettlementResult<(JobKind, i32)> {
    let kind = JobKind::from_str(&job.kind)
        .map_err(|_| SettlementError::InvalidJob(format!("unknown kind {}", job.kind)))?;
    let payload: SurveyJobPayload = serde_json::from_str(&job.payload)
        .map_err(|error| SettlementError::InvalidJob(error.to_string()))?;
    let survey_id = payload
        .survey_id
        .parse::<i32>()
        .map_err(|_| SettlementError::InvalidJob(format!("bad surveyId {}", payload.survey_id)))?;
    Ok((kind, survey_id))
}

pub struct JobRunner {
    settlement: Settlement,
    observer: Arc<dyn JobObserver>,
}

impl JobRunner {
    pub fn new(settlement: Settlement, observer: Arc<dyn JobObserver>) -> JobRunner {
        JobRunner {
            settlement,
            observer,
        }
    }

    /// Returns jobs left `running` by a crashed process to the queue.
    pub async fn recover_stale(&self) -> SettlementResult<u64> {
        let result = Job::update_many()
            .col_expr(JobColumn::Status, Expr::value(JobStatus::Pending))
            .col_expr(JobColumn::LockedAt, Expr::value(Option::<i64>::None))
            .filter(JobColumn::Status.eq(JobStatus::Running))
            .exec(self.settlement.db())
            .await?;
        if result.rows_affected > 0 {
            warn!("Requeued {} stale running jobs", result.rows_affected);
        }
        Ok(result.rows_affected)
    }

    async fn execute(&self, job: &JobModel, now: i64) -> SettlementResult<()> {
        let (kind, survey_id) = parse_job(job)?;
        match kind {
            JobKind::StartSurvey => {
                if !self.settlement.start_survey(survey_id).await? {
                    info!("Survey {} was not waiting to start", survey_id);
                }
            }
            JobKind::EndSurvey => {
                self.settlement.end_survey(survey_id, now).await?;
            }
        }
        Ok(())
    }

    /// Requeues jobs whose claim is older than the lock timeout.
    pub async fn requeue_expired_locks(&self, now_millis: i64) -> SettlementResult<u64> {
        let deadline = now_millis - self.settlement.config().job_lock_timeout_secs() * 1_000;
        let result = Job::update_many()
            .col_expr(JobColumn::Status, Expr::value(JobStatus::Pending))
            .col_expr(JobColumn::LockedAt, Expr::value(Option::<i64>::None))
            .filter(JobColumn::Status.eq(JobStatus::Running))
            .filter(JobColumn::LockedAt.lte(deadline))
            .exec(self.settlement.db())
            .await?;
        if result.rows_affected > 0 {
            warn!("Requeued {} jobs with expired locks", result.rows_affected);
        }
        Ok(result.rows_affected)
    }

    /// Runs every pending job due at `now` (Unix seconds).
    pub async fn run_due(&self, now: i64) -> SettlementResult<Vec<(i32, JobOutcome)>> {
        let db = self.settlement.db();
        let now_millis = now * 1_000;
        self.requeue_expired_locks(now_millis).await?;
        let due = Job::find()
            .filter(JobColumn::Status.eq(JobStatus::Pending))
            .filter(JobColumn::RunAt.lte(now_millis))
            .order_by_asc(JobColumn::RunAt)
            .order_by_asc(JobColumn::Id)
            .limit(self.settlement.config().job_batch_size())
            .all(db)
            .await?;

        let mut outcomes = Vec::with_capacity(due.len());
        for job in due {
            let claimed = match Job::update_many()
                .col_expr(JobColumn::Status, Expr::value(JobStatus::Running))
                .col_expr(JobColumn::LockedAt, Expr::value(Some(now_millis)))
                .filter(JobColumn::Id.eq(job.id))
                .filter(JobColumn::Status.eq(JobStatus::Pending))
                .exec(db)
                .await
            {
                Ok(claimed) => claimed,
                Err(error) => {
                    warn!("Could not claim job {}: {}", job.id, error);
                    continue;
                }
            };
            if claimed.rows_affected == 0 {
                continue;
            }

            let started_at = SystemTime::now();
            let finished = match self.execute(&job, now).await {
                Ok(()) => Job::delete_by_id(job.id)
                    .exec(db)
                    .await
                    .map(|_| JobOutcome::Completed)
                    .map_err(SettlementError::from),
                Err(error) => self.reschedule(&job, &error, now_millis).await,
            };
            let outcome = match finished {
                Ok(outcome) => outcome,
                Err(error) => {
                    // stays running until its lock expires
                    error!("Could not record the result of job {}: {}", job.id, error);
                    continue;
                }
            };
            self.observer.observe(&job, &outcome, started_at).await;
            outcomes.push((job.id, outcome));
        }
        Ok(outcomes)
    }

    async fn reschedule(
        &self,
        job: &JobModel,
        error: &SettlementError,
        now_millis: i64,
    ) -> SettlementResult<JobOutcome> {
        let attempts = job.attempts + 1;
        let message = error.to_string();
        let retryable = !matches!(error, SettlementError::InvalidJob(_));
        let mut update = Job::update_many()
            .col_expr(JobColumn::Attempts, Expr::value(attempts))
            .col_expr(JobColumn::LockedAt, Expr::value(Option::<i64>::None))
            .col_expr(JobColumn::LastError, Expr::value(Some(message.to_owned())))
            .filter(JobColumn::Id.eq(job.id));

        let outcome = if retryable && attempts < job.max_attempts {
            let backoff_millis =
                i64::from(attempts) * self.settlement.config().job_retry_backoff_secs() * 1_000;
            let next_run_at = now_millis + backoff_millis;
            update = update
                .col_expr(JobColumn::Status, Expr::value(JobStatus::Pending))
                .col_expr(JobColumn::RunAt, Expr::value(next_run_at));
            JobOutcome::Retrying {
                attempts,
                next_run_at,
                error: message,
            }
        } else {
            update = update.col_expr(JobColumn::Status, Expr::value(JobStatus::Failed));
            JobOutcome::Exhausted {
                attempts,
                error: message,
            }
        };
        update.exec(self.settlement.db()).await?;
        Ok(outcome)
    }

    /// Polls for due jobs until `shutdown` flips to true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if let Err(error) = self.recover_stale().await {
            warn!("Could not requeue stale jobs: {}", error);
        }
        let mut interval = tokio::time::interval(self.settlement.config().job_poll_interval());
        info!("Job runner started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.run_due(Utc::now().timestamp()).await {
                        warn!("Job poll failed: {}", error);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Job runner stopped");
    }
}
