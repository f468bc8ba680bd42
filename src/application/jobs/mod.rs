mod context;
mod export;
mod queue;

pub use context::{JobWorkerContext, job_failed};
pub use export::{RenderExportJobPayload, enqueue_render_export_job, process_render_export_job};
pub use queue::enqueue_job;
