use std::{path::Path, process, sync::Arc};

use apalis::{
    layers::WorkerBuilderExt,
    prelude::{Monitor, WorkerBuilder, WorkerFactoryFn},
};
use apalis_sql::{Config as ApalisSqlConfig, postgres::PostgresStorage};
use carte::{
    application::{
        catalog::{DishService, MenuService, SubmenuService},
        error::AppError,
        export::{ExportCoordinator, ExportLedger, render_workbook},
        fixtures::FillService,
        jobs::{JobWorkerContext, process_render_export_job},
        repos::{
            CatalogExportRepo, DishesRepo, DishesWriteRepo, FixturesRepo, JobsRepo, MenusRepo,
            MenusWriteRepo, SubmenusRepo, SubmenusWriteRepo,
        },
    },
    cache::{CacheConfig, SnapshotCache},
    config,
    domain::types::JobType,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        exports::ExportStorage,
        http::{self, ApiState, HealthState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Export(args) => run_export(settings, &args.file).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (http_repositories, job_repositories) = init_repositories(&settings).await?;

    let cache = Arc::new(SnapshotCache::start(&CacheConfig::from(&settings.cache)).await);
    let exports = Arc::new(
        ExportStorage::new(settings.exports.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let api_state = build_api_state(&http_repositories, cache.clone(), exports.clone(), &settings);
    let job_context = JobWorkerContext { exports };

    let monitor_handle = spawn_job_monitor(job_repositories, job_context, &settings.jobs);
    let result = serve_http(&settings, api_state, http_repositories).await;

    monitor_handle.abort();
    let _ = monitor_handle.await;
    cache.stop();
    result
}

/// Renders the current catalog straight to `path`, bypassing the job queue.
async fn run_export(settings: config::Settings, path: &Path) -> Result<(), AppError> {
    let repositories = connect_http_repositories(&settings).await?;
    let rows = repositories.list_catalog_rows().await?;

    info!(
        target = "carte::export",
        path = %path.display(),
        rows = rows.len(),
        "Starting export"
    );

    let bytes = tokio::task::spawn_blocking(move || render_workbook(&rows))
        .await
        .map_err(|err| AppError::unexpected(format!("export render task failed: {err}")))??;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;

    info!(
        target = "carte::export",
        bytes = bytes.len(),
        "Export completed"
    );
    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    connect_http_repositories(&settings).await?;
    info!(target = "carte::migrate", "Database migrations applied");
    Ok(())
}

fn build_api_state(
    repositories: &Arc<PostgresRepositories>,
    cache: Arc<SnapshotCache>,
    exports: Arc<ExportStorage>,
    settings: &config::Settings,
) -> ApiState {
    let menus_repo: Arc<dyn MenusRepo> = repositories.clone();
    let menus_write_repo: Arc<dyn MenusWriteRepo> = repositories.clone();
    let submenus_repo: Arc<dyn SubmenusRepo> = repositories.clone();
    let submenus_write_repo: Arc<dyn SubmenusWriteRepo> = repositories.clone();
    let dishes_repo: Arc<dyn DishesRepo> = repositories.clone();
    let dishes_write_repo: Arc<dyn DishesWriteRepo> = repositories.clone();
    let catalog_repo: Arc<dyn CatalogExportRepo> = repositories.clone();
    let jobs_repo: Arc<dyn JobsRepo> = repositories.clone();
    let fixtures_repo: Arc<dyn FixturesRepo> = repositories.clone();

    ApiState {
        menus: Arc::new(MenuService::new(
            menus_repo.clone(),
            menus_write_repo,
            cache.clone(),
        )),
        submenus: Arc::new(SubmenuService::new(
            menus_repo,
            submenus_repo.clone(),
            submenus_write_repo,
            cache.clone(),
        )),
        dishes: Arc::new(DishService::new(
            submenus_repo,
            dishes_repo,
            dishes_write_repo,
            cache.clone(),
        )),
        exports: Arc::new(ExportCoordinator::new(
            catalog_repo,
            jobs_repo,
            ExportLedger::new(cache.clone()),
            exports,
        )),
        fill: Arc::new(FillService::new(
            fixtures_repo,
            cache,
            settings.fill.password.clone(),
        )),
    }
}

fn database_url(settings: &config::Settings) -> Result<&str, AppError> {
    settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)
}

/// Connects the request pool and applies pending migrations.
async fn connect_http_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let http_pool = PostgresRepositories::connect(
        database_url(settings)?,
        settings.database.http_max_connections.get(),
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&http_pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(http_pool)))
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<(Arc<PostgresRepositories>, Arc<PostgresRepositories>), AppError> {
    let http_repositories = connect_http_repositories(settings).await?;

    let jobs_pool = PostgresRepositories::connect(
        database_url(settings)?,
        settings.database.jobs_max_connections.get(),
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok((
        http_repositories,
        Arc::new(PostgresRepositories::new(jobs_pool)),
    ))
}

fn spawn_job_monitor(
    repositories: Arc<PostgresRepositories>,
    context: JobWorkerContext,
    jobs: &config::JobsSettings,
) -> tokio::task::JoinHandle<()> {
    let render_export_storage = PostgresStorage::new_with_config(
        repositories.pool().clone(),
        ApalisSqlConfig::new(JobType::RenderExport.as_str()),
    );

    let render_export_worker = WorkerBuilder::new("render-export-worker")
        .concurrency(jobs.render_export_concurrency.get() as usize)
        .data(context)
        .backend(render_export_storage)
        .build_fn(process_render_export_job);

    let monitor = Monitor::new().register(render_export_worker);

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    })
}

async fn serve_http(
    settings: &config::Settings,
    api_state: ApiState,
    repositories: Arc<PostgresRepositories>,
) -> Result<(), AppError> {
    let router = http::build_router(api_state, Some(HealthState { db: repositories }));

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "carte::serve",
        addr = %settings.server.addr,
        "HTTP server listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::from(InfraError::server(err.to_string())))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "carte::serve", "shutdown signal received");
}
