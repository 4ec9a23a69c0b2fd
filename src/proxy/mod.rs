//! Proxy Module
//!
//! Connection handling: the dispatcher accepts clients and runs the
//! forwarding pipeline for each one on its own task.

pub mod dispatcher;
pub mod handler;

use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::Config;

pub use dispatcher::Dispatcher;
pub use handler::{handle_connection, Outcome};

/// State shared by every connection handler.
///
/// The cache is the only shared mutable state; it is built once at startup
/// and handed to each connection through this cheap-to-clone handle.
#[derive(Clone)]
pub struct ProxyState {
    pub cache: Arc<CacheStore>,
}

impl ProxyState {
    /// Creates a new ProxyState around the given cache.
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new ProxyState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheStore::from_config(config))
    }
}
