//! # bit-installer
//!
//! Secure acquisition of release artifacts into protected app data directories.
//!
//! ## Design Philosophy
//!
//! bit-installer is designed to be:
//! - **Validation-first** - Identifiers and paths are checked syntactically and
//!   then canonicalized and contained before anything privileged happens
//! - **Verifiable** - Every download is hashed as it is written; a digest
//!   mismatch aborts the attempt before installation
//! - **Library-first** - No UI, the elevation mechanism is an injectable trait
//! - **Event-driven** - Consumers subscribe to state transitions, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use bit_installer::{
//!     AcquisitionOrchestrator, CommandExecutor, Config, GitHubReleaseCatalog, ReleaseCatalog,
//!     SourceIdentifier, plan_acquisition,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(std::path::Path::new("apps.toml"))?;
//!
//!     let catalog = GitHubReleaseCatalog::new(&config.catalog, &config.download)?;
//!     let source = SourceIdentifier::parse(&config.catalog.source)?;
//!     let releases = catalog.list_releases(&source).await?;
//!
//!     let executor = CommandExecutor::sudo_from_path().unwrap_or_else(CommandExecutor::direct);
//!     let mut orchestrator = AcquisitionOrchestrator::new(config.clone(), Arc::new(executor))?;
//!
//!     // Subscribe to state transitions
//!     let mut states = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(state) = states.recv().await {
//!             println!("State: {:?}", state);
//!         }
//!     });
//!
//!     for app in &config.apps {
//!         let request = plan_acquisition(app, &releases)?;
//!         let outcome = orchestrator.run(request).await;
//!         println!("{}: {:?}", app.app_name, outcome);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Release catalog client
pub mod catalog;
/// Configuration types
pub mod config;
/// Streaming HTTP downloads
pub mod download;
/// Error types
pub mod error;
/// SHA-256 digests
pub mod hashing;
/// Privileged placement of verified files
pub mod installer;
/// Acquisition state machine
pub mod orchestrator;
/// Privileged execution capability
pub mod privileged;
/// Core types and data structures
pub mod types;
/// Filesystem utilities
pub mod utils;
/// Identifier and path validation
pub mod validation;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod test_helpers;

// Re-export commonly used types
pub use catalog::{
    GitHubReleaseCatalog, Release, ReleaseAsset, ReleaseCatalog, find_release, plan_acquisition,
};
pub use config::{AppConfig, CatalogConfig, Config, DownloadConfig, InstallConfig, ReleaseSourceConfig};
pub use download::Downloader;
pub use error::{Error, FailureKind, NetworkError, Result};
pub use hashing::{StreamingHasher, digest_bytes, digest_file, digests_match};
pub use installer::PrivilegedInstaller;
pub use orchestrator::AcquisitionOrchestrator;
pub use privileged::{
    AuthorizationOutcome, CommandExecutor, ExecOutput, Launcher, PrivilegedExecutor,
    UnavailableExecutor,
};
pub use types::{AcquisitionRequest, AcquisitionState, DownloadRequest, FailureReason};
pub use validation::{
    CanonicalDestination, PackageId, PathValidator, RelativeDestinationPath, SourceIdentifier,
    validate_package_identifier, validate_relative_path, validate_source_identifier,
};
