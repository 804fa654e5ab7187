pub mod model;
pub mod run_log;
pub mod worker;

pub use model::{FailedJob, ImportRun};
pub use run_log::{ImportRunRow, RunLogRepo};
pub use worker::ImportWorker;
