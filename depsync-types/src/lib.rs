//! Shared DTOs (schemas-as-code) for the depsync workspace.
//!
//! # Design constraints
//! - These types are intended to be serialized to disk.
//! - Key names follow the JavaScript ecosystem the reports are read in (camelCase).
//! - Prefer adding optional fields over changing semantics.

pub mod apply;
pub mod conflict;
pub mod manifest;
pub mod plan;
pub mod report;
pub mod unused;

/// Schema identifiers.
pub mod schema {
    pub const DEPSYNC_REPORT_V1: &str = "depsync.report.v1";
    pub const DEPSYNC_UNUSED_V1: &str = "depsync.unused.v1";
}
