// Quotebook - Core Library
// Exposes all modules for use in the CLI, TUI, and tests

pub mod quote;
pub mod reconcile;
pub mod remote;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use quote::{
    categories, filter_by_category, pick_random, seed_quotes, validate_submission, Quote,
    ValidationError, CATEGORY_ALL,
};
pub use reconcile::{CategoryConflict, MergeEngine, MergeReport};
pub use remote::{RemoteError, RemotePost, RemoteSource};
pub use store::{export_csv, import_csv, QuoteStore, SyncRecord, SyncTrigger};
pub use sync::{SyncEngine, SyncReport, DEFAULT_SYNC_INTERVAL_SECS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
