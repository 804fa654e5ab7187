use rand::Rng;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub base_seconds: i64,
    pub max_seconds: i64,
    pub jitter_pct: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_seconds: 1,
            max_seconds: 5 * 60,
            jitter_pct: 0.20,
        }
    }
}

/// Delay before the next attempt: base * 2^(attempt_no - 1), capped at
/// `max_seconds`, with +/- `jitter_pct` jitter.
pub fn next_delay_seconds(attempt_no: i32, cfg: &RetryConfig, rng: &mut impl Rng) -> i64 {
    let attempt_no = attempt_no.max(1) as u32;

    // 2^(attempt_no - 1), saturating so the cap takes over on overflow
    let pow2 = 1_i64
        .checked_shl(attempt_no.saturating_sub(1))
        .unwrap_or(i64::MAX);
    let delay = cfg.base_seconds.saturating_mul(pow2).min(cfg.max_seconds);

    let jitter_range = (delay as f64) * cfg.jitter_pct;
    let jittered = if jitter_range > 0.0 {
        (delay as f64 + rng.gen_range(-jitter_range..=jitter_range)).round() as i64
    } else {
        delay
    };

    jittered.clamp(0, cfg.max_seconds)
}
