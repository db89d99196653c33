//! hdoc: a versioned API documentation model for C libraries.
//!
//! Every tag of a git repository (plus the current `HEAD`) is checked out,
//! its public headers are parsed into a [`model::Snapshot`], and the
//! snapshots are emitted as JSON alongside a [`model::ProjectManifest`]
//! that tracks how each function's signature changed between releases.

pub mod aggregate;
pub mod config;
pub mod emit;
pub mod git;
pub mod groups;
pub mod history;
pub mod linker;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod usage;
pub mod versions;
pub mod walk;
