// Public modules
pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod index;
pub mod output;
pub mod ranges;
pub mod renumber;
pub mod scanner;
pub mod storage;
pub mod validate;

// Re-export common types for convenience
pub use config::LpkitConfig;
pub use corpus::Corpus;
pub use document::{Document, DocumentRecord};
pub use error::{Error, ErrorCode, Result};
pub use output::{BulkResult, BulkSummary, ItemOutcome};
pub use ranges::{RangePolicy, RangeRegistry};
pub use storage::{LocalStorage, MemoryStorage, Storage};
