//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.
//! The listening port is supplied separately on the command line.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// Default number of cache slots
pub const DEFAULT_CACHE_SLOTS: usize = 10;

/// Largest response, in bytes, that may be admitted to the cache
pub const MAX_OBJECT_SIZE: usize = 102_400;

/// Nominal aggregate cache budget. Capacity is enforced per slot, so this is
/// only an upper bound of `slots * MAX_OBJECT_SIZE` at the default slot count.
pub const MAX_CACHE_SIZE: usize = 1_049_000;

/// Default interval between cache statistics reports, in seconds
pub const DEFAULT_STATS_INTERVAL: u64 = 60;

/// Proxy configuration parameters.
///
/// All values except the port can be configured via environment variables
/// with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of fixed cache slots
    pub cache_slots: usize,
    /// Per-object admission limit in bytes
    pub max_object_size: usize,
    /// Statistics report interval in seconds (0 disables the report)
    pub stats_interval: u64,
    /// Address the listener binds to
    pub bind_address: IpAddr,
    /// Listening port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_SLOTS` - Number of cache slots (default: 10)
    /// - `MAX_OBJECT_SIZE` - Per-object size limit in bytes (default: 102400)
    /// - `STATS_INTERVAL` - Stats report frequency in seconds (default: 60)
    /// - `BIND_ADDRESS` - Listen address (default: 0.0.0.0)
    ///
    /// Zero slot counts and zero object sizes are ignored in favour of the
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_slots: env_var::<usize>("CACHE_SLOTS")
                .filter(|slots| *slots > 0)
                .unwrap_or(defaults.cache_slots),
            max_object_size: env_var::<usize>("MAX_OBJECT_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.max_object_size),
            stats_interval: env_var("STATS_INTERVAL").unwrap_or(defaults.stats_interval),
            bind_address: env_var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            server_port: defaults.server_port,
        }
    }

    /// Sets the listening port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    /// Socket address the dispatcher binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.server_port)
    }
}

fn env_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_slots: DEFAULT_CACHE_SLOTS,
            max_object_size: MAX_OBJECT_SIZE,
            stats_interval: DEFAULT_STATS_INTERVAL,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            server_port: 0,
        }
    }
}
