pub mod aggregation;
pub mod catalog;
pub mod providers;

pub use aggregation::{AggregationService, AllContent, StatusBuckets};
pub use catalog::CatalogAdapter;
