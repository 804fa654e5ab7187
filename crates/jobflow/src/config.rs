pub const DEFAULT_FEED_URLS: &[&str] = &[
    "https://jobicy.com/?feed=job_feed",
    "https://jobicy.com/?feed=job_feed&job_categories=smm&job_types=full-time",
    "https://jobicy.com/?feed=job_feed&job_categories=data-science",
    "https://www.higheredjobs.com/rss/articleFeed.cfm",
];

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub worker_id: String,
    pub concurrency: usize,
    pub cron_schedule: String,
    pub feed_urls: Vec<String>,
    pub fetch_timeout_secs: u64,
    pub max_attempts: i32,
    pub lease_seconds: i64,
    pub admin_addr: Option<String>,
    pub migrate_on_startup: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is missing"))?;

        let worker_id = env_or_fallback("JOBFLOW_WORKER_ID", "WORKER_ID")
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_else(|| "worker-1".to_string());

        let concurrency = env_or_fallback("JOBFLOW_CONCURRENCY", "CONCURRENCY")
            .and_then(|s| s.parse().ok())
            .unwrap_or(4)
            .max(1);

        let cron_schedule =
            env_or_fallback("JOBFLOW_IMPORT_CRON_SCHEDULE", "IMPORT_CRON_SCHEDULE")
                .unwrap_or_else(|| "0 * * * *".to_string());

        let feed_urls = feed_urls_from_env();

        let fetch_timeout_secs = env_or_fallback("JOBFLOW_FETCH_TIMEOUT_SECS", "FETCH_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(20);

        let max_attempts = env_or_fallback("JOBFLOW_MAX_ATTEMPTS", "MAX_ATTEMPTS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);

        let lease_seconds = env_or_fallback("JOBFLOW_LEASE_SECONDS", "LEASE_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let admin_addr = env_or_fallback("JOBFLOW_ADMIN_ADDR", "ADMIN_ADDR")
            .and_then(|s| normalize_optional_addr(&s));

        let migrate_on_startup = env_bool("JOBFLOW_MIGRATE_ON_STARTUP").unwrap_or(false);

        Ok(Self {
            database_url,
            worker_id,
            concurrency,
            cron_schedule,
            feed_urls,
            fetch_timeout_secs,
            max_attempts,
            lease_seconds,
            admin_addr,
            migrate_on_startup,
        })
    }
}

/// Configured feed list: `FEED_URLS` as a comma-separated list, or the
/// built-in defaults when unset.
pub fn feed_urls_from_env() -> Vec<String> {
    env_or_fallback("JOBFLOW_FEED_URLS", "FEED_URLS")
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|urls| !urls.is_empty())
        .unwrap_or_else(|| DEFAULT_FEED_URLS.iter().map(|s| s.to_string()).collect())
}

fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn normalize_optional_addr(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if matches!(v.to_lowercase().as_str(), "0" | "off" | "false" | "none") {
        return None;
    }
    Some(v.to_string())
}
