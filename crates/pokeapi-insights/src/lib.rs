//! pokeapi-insights — resilient caching PokeAPI client with paginated listings,
//! evolution-chain traversal, and analytical queries.

pub mod chain;
pub mod client;
pub mod config;
pub mod doc;
pub mod queries;
pub mod report;
pub mod testing;
pub mod transport;
pub mod types;

pub use chain::flatten;
pub use client::PokeClient;
pub use config::ClientConfig;
pub use doc::DocExt;
pub use report::Report;
pub use transport::{resolve_url, HttpTransport, RetryPolicy, Transport};
pub use types::*;
