#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Buildline Log
//!
//! Process-level logging bootstrap. Library crates only emit events through
//! `tracing`; a binary or test harness installs a subscriber once with
//! [`init`].
//!
//! ```rust,no_run
//! use buildline_log::Config;
//!
//! buildline_log::init(&Config::from_env()).expect("logger");
//! tracing::info!("ready");
//! ```

mod builder;
mod config;
mod error;

pub use builder::init;
pub use config::{Config, Format};
pub use error::LogError;
