pub mod config;
pub mod error;
pub mod export;
pub mod http_cache;
pub mod http_client;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod service_account;
pub mod sheets_fetch;
pub mod state;
pub mod table;
