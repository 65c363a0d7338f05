pub mod errors;
pub mod filters;
pub mod models;
pub mod scheduler;
pub mod sm2;
pub mod stats;
pub mod store;

pub use errors::*;
pub use filters::*;
pub use models::*;
pub use scheduler::*;
pub use sm2::*;
pub use stats::*;
pub use store::memory::MemoryStore;
pub use store::{ExportBundle, Snapshot, Store, DEFAULT_STORAGE_KEY};
