//! Wiring for the `mxtls` binary: configuration discovery and the two ways
//! of running the prober.

mod config;
pub mod controller;

pub use config::{CONFIG_ENV, Config, ConfigError};
pub use controller::{Mxtls, report};
