//! CBI Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared infrastructure for the CBI workspace members. Currently this is the
//! logging setup every binary installs at startup; see [`logging`].

pub mod logging;

pub use logging::{init_logging, LogConfig, LoggingGuard};
