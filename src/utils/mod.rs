pub mod config;
pub mod http_client;
pub mod logging;
pub mod market_time;
pub mod middleware;
pub mod ws_broadcast;
