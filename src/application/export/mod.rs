//! Spreadsheet export of the whole catalog.
//!
//! Submission snapshots the flattened catalog into a `render_export` job and
//! records the job id in the export ledger. The worker partitions the rows,
//! places them on a sheet and writes the workbook into export storage. Polling
//! maps the queue state back onto [`ExportStatus`].

mod layout;
mod ledger;
mod partition;

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::jobs::{RenderExportJobPayload, enqueue_render_export_job};
use crate::application::repos::{CatalogExportRepo, JobsRepo, RepoError};
use crate::domain::entities::CatalogRow;
use crate::domain::types::ExportStatus;
use crate::infra::exports::{ExportStorage, ExportStorageError};
use crate::infra::xlsx::{WorkbookError, write_workbook};

pub use layout::{CellValue, LayoutError, MAX_ROWS, PlacedCell, place};
pub use ledger::ExportLedger;
pub use partition::{DishEntry, MenuEntry, Partition, SubmenuEntry, partition};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export queue unavailable")]
    QueueUnavailable(#[source] RepoError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("export file not found")]
    ArtifactMissing,
    #[error(transparent)]
    Storage(ExportStorageError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
}

impl From<ExportStorageError> for ExportError {
    fn from(err: ExportStorageError) -> Self {
        match err {
            ExportStorageError::Missing => ExportError::ArtifactMissing,
            other => ExportError::Storage(other),
        }
    }
}

/// Outcome of polling a job id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportPoll {
    /// The id was never handed out by this service.
    Unrequested,
    Pending(ExportStatus),
    Ready { file_name: String, content: Bytes },
}

/// Partition, place and serialize `rows` into xlsx bytes.
pub fn render_workbook(rows: &[CatalogRow]) -> Result<Vec<u8>, ExportError> {
    let cells = place(&partition(rows))?;
    Ok(write_workbook(&cells)?)
}

fn artifact_name() -> String {
    format!("catalog-{}.xlsx", Uuid::new_v4())
}

#[derive(Clone)]
pub struct ExportCoordinator {
    catalog: Arc<dyn CatalogExportRepo>,
    jobs: Arc<dyn JobsRepo>,
    ledger: ExportLedger,
    storage: Arc<ExportStorage>,
}

impl ExportCoordinator {
    pub fn new(
        catalog: Arc<dyn CatalogExportRepo>,
        jobs: Arc<dyn JobsRepo>,
        ledger: ExportLedger,
        storage: Arc<ExportStorage>,
    ) -> Self {
        Self {
            catalog,
            jobs,
            ledger,
            storage,
        }
    }

    /// Queue a render of the current catalog and return the job id.
    pub async fn submit(&self) -> Result<String, ExportError> {
        let rows = self.catalog.list_catalog_rows().await?;
        let row_count = rows.len();
        let artifact = artifact_name();
        let payload = RenderExportJobPayload {
            artifact: artifact.clone(),
            rows,
        };

        let job_id = enqueue_render_export_job(self.jobs.as_ref(), &payload)
            .await
            .map_err(ExportError::QueueUnavailable)?;
        self.ledger.record(&job_id, &artifact).await;

        counter!("carte_export_submitted_total").increment(1);
        info!(
            target = "carte::application::export",
            job_id = %job_id,
            artifact = %artifact,
            rows = row_count,
            "catalog export queued"
        );
        Ok(job_id)
    }

    /// Current state of `job_id`. Has no side effects.
    pub async fn poll(&self, job_id: &str) -> Result<ExportPoll, ExportError> {
        let Some(artifact) = self.ledger.lookup(job_id).await else {
            return Ok(ExportPoll::Unrequested);
        };

        let status = match self.jobs.find_job(job_id).await? {
            Some(job) => {
                let status = job.export_status();
                if status == ExportStatus::Failed {
                    warn!(
                        target = "carte::application::export",
                        job_id = %job_id,
                        attempts = job.attempts,
                        max_attempts = job.max_attempts,
                        error = job.last_error.as_deref().unwrap_or("unknown"),
                        "catalog export failed"
                    );
                }
                status
            }
            None => ExportStatus::Requested,
        };

        if status != ExportStatus::Succeeded {
            return Ok(ExportPoll::Pending(status));
        }

        let content = self.storage.read(&artifact).await?;
        Ok(ExportPoll::Ready {
            file_name: artifact,
            content,
        })
    }
}
