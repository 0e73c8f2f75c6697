//! Podcatcher gateway library: whitelisted fetch proxy + sync endpoint.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod store;
pub mod sync;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
