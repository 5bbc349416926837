//! Git operations for release workflows.
//!
//! This module provides the [`VersionControl`] capability set and its
//! production implementation on top of the system `git` executable.

mod operations;
mod system_git;

pub use operations::{CommitInfo, VersionControl};
pub use system_git::SystemGit;
