use std::sync::Arc;
use std::time::Duration;

use jobflow::api;
use jobflow::config::Config;
use jobflow::db;
use jobflow::feed::FeedFetcher;
use jobflow::imports::{ImportWorker, RunLogRepo};
use jobflow::jobs::JobStore;
use jobflow::queue::{RetryConfig, TaskQueue, TaskRunner, WorkerPool};
use jobflow::scheduler::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobflow=info,worker=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;

    tracing::info!(
        worker_id = %cfg.worker_id,
        concurrency = cfg.concurrency,
        cron_schedule = %cfg.cron_schedule,
        feeds = cfg.feed_urls.len(),
        fetch_timeout_secs = cfg.fetch_timeout_secs,
        max_attempts = cfg.max_attempts,
        lease_seconds = cfg.lease_seconds,
        admin = %cfg.admin_addr.clone().unwrap_or_else(|| "disabled".to_string()),
        migrate_on_startup = cfg.migrate_on_startup,
        "jobflow worker starting"
    );

    let pool = db::make_pool(&cfg.database_url).await?;
    if cfg.migrate_on_startup {
        db::run_migrations(&pool).await?;
    }

    let store = JobStore::new(pool.clone());
    let run_log = RunLogRepo::new(pool.clone());
    let queue = TaskQueue::new(pool.clone(), cfg.max_attempts);

    let fetcher = Arc::new(FeedFetcher::new(Duration::from_secs(cfg.fetch_timeout_secs)));
    let importer = Arc::new(ImportWorker::new(fetcher, store.clone(), run_log.clone()));

    // ---- Worker pool ----
    let runner = TaskRunner::new(queue.clone(), RetryConfig::default());
    let _workers = WorkerPool::new(
        queue.clone(),
        importer,
        runner,
        cfg.worker_id.clone(),
        cfg.concurrency,
        cfg.lease_seconds,
    )
    .spawn();

    // ---- Recurring imports ----
    let scheduler = Arc::new(Scheduler::new(
        queue.clone(),
        cfg.feed_urls.clone(),
        &cfg.cron_schedule,
    ));
    scheduler.start().await?;

    // ---- Admin API ----
    let api_state = api::ApiState {
        queue,
        store,
        run_log,
        scheduler: scheduler.clone(),
    };
    let app = api::router(api_state);
    let api_addr = cfg.admin_addr.clone();

    let api_handle = tokio::spawn(async move {
        if let Some(addr) = api_addr {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(%addr, "admin api listening");
            axum::serve(listener, app).await?;
        } else {
            std::future::pending::<()>().await;
        }
        Ok::<(), anyhow::Error>(())
    });

    tokio::select! {
        res = api_handle => res??,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    scheduler.stop().await?;
    Ok(())
}
