use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;

use jobflow::config;
use jobflow::imports::RunLogRepo;
use jobflow::jobs::JobStore;
use jobflow::queue::TaskQueue;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "jobflowctl <command>\n\
             Commands:\n\
             - reset\n\
             - enqueue <feed_url>\n\
             - trigger\n\
             - logs [n]\n\
             - stats\n\
             \n\
             Uses DATABASE_URL or TEST_DATABASE_URL.\n"
        );
        std::process::exit(2);
    }

    let _ = dotenvy::dotenv();

    let url = env::var("DATABASE_URL")
        .or_else(|_| env::var("TEST_DATABASE_URL"))
        .expect("DATABASE_URL or TEST_DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    let max_attempts: i32 = env::var("JOBFLOW_MAX_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);
    let queue = TaskQueue::new(pool.clone(), max_attempts);

    match args[1].as_str() {
        "reset" => reset(&pool).await?,
        "enqueue" => {
            let feed_url = args.get(2).expect("usage: jobflowctl enqueue <feed_url>");
            let task_id = queue.enqueue(feed_url).await?;
            println!("+ queued import task {task_id} for {feed_url}");
        }
        "trigger" => {
            for feed_url in config::feed_urls_from_env() {
                match queue.enqueue(&feed_url).await {
                    Ok(task_id) => println!("+ queued import task {task_id} for {feed_url}"),
                    Err(e) => eprintln!("! failed to queue {feed_url}: {e}"),
                }
            }
        }
        "logs" => {
            let n: i64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);
            print_logs(&pool, n).await?;
        }
        "stats" => print_stats(&pool, &queue).await?,
        other => {
            eprintln!("Unknown command: {other}");
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn reset(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        TRUNCATE TABLE
            import_runs,
            import_tasks,
            jobs
        RESTART IDENTITY CASCADE
        "#,
    )
    .execute(pool)
    .await?;

    println!("reset OK");
    Ok(())
}

async fn print_logs(pool: &PgPool, n: i64) -> anyhow::Result<()> {
    let runs = RunLogRepo::new(pool.clone()).list_recent(n).await?;

    if runs.is_empty() {
        println!("no import runs recorded");
        return Ok(());
    }

    for run in runs {
        let failed = run
            .failed_jobs
            .as_array()
            .map(|seq| seq.len())
            .unwrap_or(0);
        println!(
            "{} attempt={} fetched={} imported={} new={} updated={} failed={} {}",
            run.finished_at.format("%Y-%m-%d %H:%M:%S"),
            run.attempt,
            run.total_fetched,
            run.total_imported,
            run.new_jobs,
            run.updated_jobs,
            failed,
            run.feed_url,
        );
    }

    Ok(())
}

async fn print_stats(pool: &PgPool, queue: &TaskQueue) -> anyhow::Result<()> {
    let total_jobs = JobStore::new(pool.clone()).count_jobs().await?;
    let (queued, running, dead) = queue.depth().await?;
    let last = RunLogRepo::new(pool.clone()).most_recent().await?;

    println!("jobs: total={total_jobs}");
    println!("tasks: queued={queued} running={running} dead={dead}");
    match last {
        Some(run) => println!(
            "last import: {} {} fetched={} imported={}",
            run.finished_at.format("%Y-%m-%d %H:%M:%S"),
            run.feed_url,
            run.total_fetched,
            run.total_imported,
        ),
        None => println!("last import: none"),
    }

    Ok(())
}
