//! Snapshot data model

mod check;
mod kind;
pub mod manifest;
mod minimal;
mod result;

pub use check::{Drift, KindCheck, RestoreCheck, Wanted};
pub use kind::ComponentKind;
pub use manifest::{SnapshotManifest, MANIFEST_FILE, SCHEMA_VERSION};
pub use minimal::MinimalSnapshot;
pub use result::{CapturedItem, ComponentResult, RestoreResult};
