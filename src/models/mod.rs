pub mod index_entry;
pub mod stock_record;

pub use index_entry::{decode_entry, EntryFormat, PrefixIndexEntry};
pub use stock_record::{NewStockRecord, StockRecord};
