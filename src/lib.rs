//! Caching Proxy - A forwarding HTTP proxy with a bounded response cache
//!
//! Relays GET requests to origin servers, streams responses back unmodified,
//! and keeps small responses in a fixed-slot, concurrently accessed cache with
//! approximate LRU eviction.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod proxy;
pub mod tasks;

pub use config::Config;
pub use error::{ProxyError, Result};
pub use proxy::{Dispatcher, ProxyState};
pub use tasks::spawn_stats_reporter;
