pub mod autocomplete;
pub mod scheduler;
pub mod stock_record;

pub use autocomplete::AutocompleteQuery;
pub use scheduler::{IngestStatusResponse, TriggerIngestResponse};
pub use stock_record::{StockRecordResponse, TopStocksQuery};
