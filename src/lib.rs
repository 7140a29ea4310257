pub mod apis;
pub mod arguments;
pub mod bus;
pub mod cache;
pub mod config;
pub mod enrichment;
pub mod helpers;
pub mod logger;
pub mod migration;
pub mod monitor;
pub mod rpc;
pub mod scoring;
pub mod sol_price;
pub mod types;
pub mod webserver;

pub use config::{ProviderConfig, ScoringConfig};
pub use enrichment::{EnrichMode, Enricher};
pub use migration::MigrationSource;
pub use monitor::TokenMonitor;
