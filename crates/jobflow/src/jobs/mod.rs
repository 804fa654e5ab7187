pub mod model;
pub mod store;

pub use model::JobRecord;
pub use store::{JobStore, UpsertError, UpsertOutcome};
