//! Embeddable core library for depsync.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into other tooling.
//!
//! # Port traits
//!
//! Side effects beyond the workspace itself sit behind port traits in [`ports`]:
//! - [`Installer`](ports::Installer): run the package-manager install
//! - [`UnusedOracle`](ports::UnusedOracle): find declared dependencies that are never imported
//! - [`WritePort`](ports::WritePort): write report and backup files
//!
//! Manifests are accessed through [`Workspace`]. The [`adapters`] module provides default
//! process- and filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run_sync`](pipeline::run_sync): detect, plan, apply, install
//! - [`run_unused`](pipeline::run_unused): unused-dependency check, optionally cleaning
//! - [`run_overlap`](pipeline::run_overlap): root overlap report
//! - [`run_lockfile_check`](pipeline::run_lockfile_check): frozen-lockfile install

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the workspace capability so callers don't need depsync-domain directly.
pub use depsync_domain::{FsWorkspace, InMemoryWorkspace, PackageOverlap, Workspace};
