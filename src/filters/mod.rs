//! Filter catalog and deterministic filter extraction.

pub mod catalog;
pub mod extractor;

pub use catalog::{FilterCatalog, FilterField, RANGE_SENTINEL};
pub use extractor::{ExtractedFilters, FilterExtractor, FilterValues};
