//! Services wired onto a `sqlx::test` database. Only the job queue is
//! replaced: `sqlx::test` applies the catalog migrations, not the apalis
//! schema, so render jobs are held in memory and run on demand.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use carte::application::catalog::{DishService, MenuService, SubmenuService};
use carte::application::export::{ExportCoordinator, ExportLedger, render_workbook};
use carte::application::fixtures::FillService;
use carte::application::jobs::RenderExportJobPayload;
use carte::application::repos::{JobsRepo, NewJobRecord, RepoError};
use carte::cache::{CacheConfig, SnapshotCache};
use carte::domain::entities::JobRecord;
use carte::domain::types::JobState;
use carte::infra::db::PostgresRepositories;
use carte::infra::exports::ExportStorage;
use carte::infra::http::ApiState;

// Not every test binary seeds through `/fill`.
#[allow(dead_code)]
pub const FILL_PASSWORD: &str = "let-me-seed";

/// Job queue that records submissions and runs them only when asked.
#[derive(Default)]
pub struct ManualJobsRepo {
    jobs: Mutex<HashMap<String, JobRecord>>,
    unavailable: AtomicBool,
}

impl ManualJobsRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every later submission fail as if the queue were unreachable.
    #[allow(dead_code)]
    pub fn go_offline(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub async fn set_state(&self, id: &str, state: JobState) {
        if let Some(job) = self.jobs.lock().await.get_mut(id) {
            job.state = state;
        }
    }

    /// One failed attempt, the way the worker records it.
    #[allow(dead_code)]
    pub async fn fail_attempt(&self, id: &str) {
        if let Some(job) = self.jobs.lock().await.get_mut(id) {
            job.state = JobState::Failed;
            job.attempts += 1;
            job.last_error = Some("render failed".into());
        }
    }

    #[allow(dead_code)]
    pub async fn forget(&self, id: &str) {
        self.jobs.lock().await.remove(id);
    }

    /// Renders every pending job into `storage` the way the worker does and
    /// marks it done.
    #[allow(dead_code)]
    pub async fn run_pending(&self, storage: &ExportStorage) {
        let mut jobs = self.jobs.lock().await;
        for job in jobs.values_mut() {
            if job.state != JobState::Pending {
                continue;
            }
            let payload: RenderExportJobPayload =
                serde_json::from_value(job.payload.clone()).expect("render payload");
            let bytes = render_workbook(&payload.rows).expect("workbook renders");
            storage
                .write(&payload.artifact, &bytes)
                .await
                .expect("artifact written");
            job.state = JobState::Done;
            job.attempts += 1;
            job.done_at = Some(OffsetDateTime::now_utc());
        }
    }
}

#[async_trait]
impl JobsRepo for ManualJobsRepo {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        let id = uuid::Uuid::new_v4().to_string();
        let record = JobRecord {
            id: id.clone(),
            job_type: job.job_type,
            payload: job.payload,
            state: JobState::Pending,
            attempts: 0,
            max_attempts: job.max_attempts,
            done_at: None,
            last_error: None,
        };
        self.jobs.lock().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn find_job(&self, id: &str) -> Result<Option<JobRecord>, RepoError> {
        Ok(self.jobs.lock().await.get(id).cloned())
    }
}

/// Everything a test needs to drive the services directly or over HTTP.
pub struct TestApp {
    pub repos: Arc<PostgresRepositories>,
    // Catalog-only tests never touch the queue or the artifact directory.
    #[allow(dead_code)]
    pub jobs: Arc<ManualJobsRepo>,
    #[allow(dead_code)]
    pub storage: Arc<ExportStorage>,
    pub state: ApiState,
    _exports_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new(pool: PgPool) -> Self {
        let cache = Arc::new(SnapshotCache::in_memory(&CacheConfig::default()));
        Self::with_cache(pool, cache)
    }

    pub fn with_cache(pool: PgPool, cache: Arc<SnapshotCache>) -> Self {
        let repos = Arc::new(PostgresRepositories::new(pool));
        let jobs = ManualJobsRepo::new();
        let exports_dir = tempfile::tempdir().expect("tempdir");
        let storage =
            Arc::new(ExportStorage::new(exports_dir.path().to_path_buf()).expect("export storage"));

        let state = ApiState {
            menus: Arc::new(MenuService::new(repos.clone(), repos.clone(), cache.clone())),
            submenus: Arc::new(SubmenuService::new(
                repos.clone(),
                repos.clone(),
                repos.clone(),
                cache.clone(),
            )),
            dishes: Arc::new(DishService::new(
                repos.clone(),
                repos.clone(),
                repos.clone(),
                cache.clone(),
            )),
            exports: Arc::new(ExportCoordinator::new(
                repos.clone(),
                jobs.clone(),
                ExportLedger::new(cache.clone()),
                storage.clone(),
            )),
            fill: Arc::new(FillService::new(
                repos.clone(),
                cache.clone(),
                Some(FILL_PASSWORD.to_string()),
            )),
        };

        Self {
            repos,
            jobs,
            storage,
            state,
            _exports_dir: exports_dir,
        }
    }

    /// Rewrites a title straight in the table, leaving any cached snapshot
    /// untouched. A later read that still shows the old title came from the
    /// cache.
    #[allow(dead_code)]
    pub async fn retitle_behind_cache(&self, table: &str, id: i64, title: &str) {
        let updated = sqlx::query(&format!("UPDATE {table} SET title = $1 WHERE id = $2"))
            .bind(title)
            .bind(id)
            .execute(self.repos.pool())
            .await
            .expect("direct update");
        assert_eq!(updated.rows_affected(), 1, "{table} row {id} exists");
    }

    #[allow(dead_code)]
    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.repos.pool())
            .await
            .expect("row count")
    }
}
