use datadog_apm::{ErrorInfo, Span, Trace};
use std::{
    collections::HashMap,
    time::{Duration, SystemTime},
};
use tracing::warn;

/// Reports one job execution as a custom span.
pub fn send_job_trace(
    datadog_client: Option<&datadog_apm::Client>,
    job_kind: &str,
    job_id: i32,
    system_time_start: SystemTime,
    error: Option<ErrorInfo>,
) {
    let datadog_client = match datadog_client {
        Some(client) => client,
        None => return,
    };
    let duration = match SystemTime::now().duration_since(system_time_start) {
        Ok(d) => d,
        Err(error) => {
            warn!("Failed calculating duration: {}", error);
            Duration::from_millis(0)
        }
    };

    let mut tags = HashMap::new();
    tags.insert("job.id".to_owned(), job_id.to_string());
    let span = Span {
        id: 1,
        parent_id: None,
        name: "som-worker.job".to_owned(),
        resource: job_kind.to_owned(),
        // web, db, cache, custom
        r#type: "custom".to_owned(),
        start: system_time_start,
        duration,
        http: None,
        error,
        sql: None,
        tags,
    };

    let trace = Trace {
        id: 1,
        priority: 1,
        spans: vec![span],
    };

    datadog_client.clone().send_trace(trace);
}

pub fn job_error(error_type: &str, msg: String) -> ErrorInfo {
    ErrorInfo {
        r#type: error_type.to_owned(),
        msg,
        stack: "".to_owned(),
    }
}
