//! Logging utilities.
//!
//! The engine only emits through the `log` facade. Hosts that do not install
//! their own logger can call [`init_logging`] early in `main`.

mod init;

pub use init::{init_logging, LoggingConfig};
