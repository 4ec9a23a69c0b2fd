//! Background Tasks Module
//!
//! Contains background tasks that run periodically during proxy operation.
//!
//! # Tasks
//! - Stats report: Logs cache activity at the configured interval

mod stats_report;

pub use stats_report::spawn_stats_reporter;
