pub mod autocomplete;
pub mod error;
pub mod scheduler;
pub mod stock_record;
pub mod ws_handler;
