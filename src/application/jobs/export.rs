use std::time::Instant;

use apalis::prelude::{Data, Error as ApalisError};
use metrics::histogram;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    application::export::render_workbook,
    application::repos::{JobsRepo, RepoError},
    domain::entities::CatalogRow,
    domain::types::JobType,
};

use super::{
    context::{JobWorkerContext, job_failed},
    queue::enqueue_job,
};

const MAX_ATTEMPTS: i32 = 3;
const PRIORITY: i32 = 5;

/// Catalog snapshot taken at submission time plus the file it renders into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderExportJobPayload {
    pub artifact: String,
    pub rows: Vec<CatalogRow>,
}

pub async fn enqueue_render_export_job<J: JobsRepo + ?Sized>(
    repo: &J,
    payload: &RenderExportJobPayload,
) -> Result<String, RepoError> {
    enqueue_job(
        repo,
        JobType::RenderExport,
        payload,
        MAX_ATTEMPTS,
        PRIORITY,
    )
    .await
}

pub async fn process_render_export_job(
    payload: RenderExportJobPayload,
    context: Data<JobWorkerContext>,
) -> Result<(), ApalisError> {
    let ctx = &*context;
    let started = Instant::now();
    let RenderExportJobPayload { artifact, rows } = payload;
    let row_count = rows.len();

    let rendered = tokio::task::spawn_blocking(move || render_workbook(&rows))
        .await
        .map_err(job_failed)?;
    let bytes = match rendered {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(
                target = "application::jobs::process_render_export_job",
                artifact = %artifact,
                error = %err,
                "export render failed"
            );
            return Err(job_failed(err));
        }
    };

    let path = ctx
        .exports
        .write(&artifact, &bytes)
        .await
        .map_err(job_failed)?;

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    histogram!("carte_export_render_ms").record(elapsed_ms);
    info!(
        target = "application::jobs::process_render_export_job",
        artifact = %artifact,
        path = %path.display(),
        rows = row_count,
        bytes = bytes.len(),
        elapsed_ms,
        "export written"
    );

    Ok(())
}
