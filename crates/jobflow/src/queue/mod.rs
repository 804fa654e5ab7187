pub mod model;
pub mod repo;
pub mod retry;
pub mod runner;
pub mod worker_pool;

pub use model::{ImportTask, TaskStatus};
pub use repo::TaskQueue;
pub use retry::{next_delay_seconds, RetryConfig};
pub use runner::TaskRunner;
pub use worker_pool::WorkerPool;
