//! Backup and restore orchestration engine for rego.
//!
//! This crate drives component adapters to capture a desktop's state into a
//! snapshot directory and to restore it idempotently:
//! - Component registry with deterministic processing order
//! - Drift detection (wanted minus installed) used by every restore
//! - Backup and restore orchestrators with progress and cancellation
//! - Snapshot store with per-directory locking
//! - Streaming tar.gz archiver with path-escape protection
//! - Minimal single-file snapshots
//!
//! # Example
//!
//! ```no_run
//! use rego_backup::{BackupOrchestrator, ComponentRegistry, HostIdentity, SnapshotStore};
//! use rego_core::HostCapabilities;
//!
//! # async fn example(registry: ComponentRegistry) -> rego_core::Result<()> {
//! let host = HostCapabilities::detect();
//! let store = SnapshotStore::new(SnapshotStore::default_location()?);
//! let target = store.new_snapshot_dir()?;
//!
//! let manifest = BackupOrchestrator::new(&registry, &store, HostIdentity::current(&host))
//!     .run(None, &target, Some("before reinstall".into()))
//!     .await?;
//! println!("captured {} items", manifest.total_items());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod backup;
pub mod cancel;
pub mod drift;
pub mod minimal;
pub mod progress;
pub mod registry;
pub mod restore;
pub mod store;

pub use archive::{ArchiveStats, Archiver, PackResult};
pub use backup::{BackupOrchestrator, HostIdentity};
pub use cancel::CancelToken;
pub use drift::{filter_missing, ItemDrift};
pub use minimal::{MinimalCapture, MinimalReport};
pub use progress::{BackupStep, ProgressReporter, RestoreStep, StepPhase};
pub use registry::ComponentRegistry;
pub use restore::{RestoreOrchestrator, RestoreReport, RestoreSource};
pub use store::{SnapshotStore, StoreLock};
