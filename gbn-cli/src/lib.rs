//! GBN CLI Library
//!
//! Shared functionality for the simulator command-line tool.

pub mod config;
pub mod script;
pub mod stats;

pub use config::{CliConfigError, Config, RunConfig};
pub use script::Script;
pub use stats::{
    display_compact_status, display_report, format_duration, format_log_entry, format_report,
    format_status_line,
};
