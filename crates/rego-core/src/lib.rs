//! Core library for rego
//!
//! This crate provides:
//! - The snapshot data model (manifests, minimal snapshots, results)
//! - The component adapter trait
//! - Settings and filesystem layout
//! - Host capability detection and bounded command execution

pub mod command;
pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod types;
pub mod utils;

pub use command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use component::{ApplyRequest, Component};
pub use config::{RegoPaths, Settings, Timeouts};
pub use error::{Error, Result};
pub use host::{Desktop, HostCapabilities, PackageManager};
pub use types::*;
