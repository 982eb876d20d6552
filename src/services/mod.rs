pub mod autocomplete;
pub mod error;
pub mod record_parser;
pub mod source_fetcher;
