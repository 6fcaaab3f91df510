//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_option_source_cache;
mod json_file_schema_store;
mod static_option_source_fetcher;

pub use in_memory_option_source_cache::InMemoryOptionSourceCache;
pub use json_file_schema_store::JsonFileSchemaStore;
pub use static_option_source_fetcher::StaticOptionSourceFetcher;
