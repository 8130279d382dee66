pub mod error;
pub mod filter;
pub mod search;
pub mod segment;
pub mod similarity;
pub mod stats;
pub mod store;
pub mod types;

pub use error::CatalogError;
pub use store::{CatalogStore, PutOutcome, ScanReport};
pub use types::{EditableField, Partition, Record, RecordField, SimilarityResult};
