use time::OffsetDateTime;

use crate::{
    application::repos::{JobsRepo, NewJobRecord, RepoError},
    domain::types::JobType,
};

/// Enqueue a job that is due immediately, returning the id assigned by the queue.
pub async fn enqueue_job<J, P>(
    repo: &J,
    job_type: JobType,
    payload: &P,
    max_attempts: i32,
    priority: i32,
) -> Result<String, RepoError>
where
    J: JobsRepo + ?Sized,
    P: serde::Serialize,
{
    let payload = serde_json::to_value(payload)
        .map_err(|err| RepoError::InvalidInput {
            message: format!("job payload is not serializable: {err}"),
        })?;
    let record = NewJobRecord {
        job_type,
        payload,
        run_at: OffsetDateTime::now_utc(),
        max_attempts,
        priority,
    };

    repo.enqueue_job(record).await
}
