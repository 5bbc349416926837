//! # release_flow
//!
//! Guarded alpha/beta/stable release trains on top of git and GitHub releases.
//!
//! A merged pull request is mapped to a release phase by its branch names:
//!
//! | source            | target            | phase  |
//! |-------------------|-------------------|--------|
//! | `feature/*`, `fix/*` | `dev/vX.Y.Z`   | alpha  |
//! | `fix/*`           | `release/vX.Y.Z`  | beta   |
//! | `dev/vX.Y.Z`      | `release/vX.Y.Z`  | freeze |
//! | `release/vX.Y.Z`  | `main`            | stable |
//!
//! Before any side effect the guardrails run (draft intent present, feature
//! freeze, fixes only, CI green, global freeze). Prereleases are tagged and
//! published as GitHub prereleases; a stable release publishes the draft
//! release intent, moves the `vX` / `vX.Y` tags and opens backflow pull
//! requests into the other open trains.
//!
//! ## Usage
//!
//! ```bash
//! release_flow start-train 1.3.0                  # dev/v1.3.0 + draft intent
//! release_flow merge --event $GITHUB_EVENT_PATH   # run the merged PR's phase
//! release_flow check --event event.json --json    # dry run
//! release_flow next-prerelease 1.3.0 --kind beta  # v1.3.0-beta.N
//! release_flow stamp 1.3.0 --pre beta2            # write versions into files
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod branch;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fakes;
pub mod git;
pub mod github;
pub mod guardrails;
pub mod phases;
pub mod presence;
pub mod tagging;
pub mod train;
pub mod version;
pub mod workflow;

pub use branch::{BranchKind, ReleaseVersion, classify};
pub use cli::Args;
pub use config::{CiPolicy, EnvConfig, FlowConfig, FreezeConfig};
pub use context::{ContextResolver, MergeEvent, Phase, ReleaseContext};
pub use error::{CliError, ReleaseError, Result};
pub use git::{SystemGit, VersionControl};
pub use github::{GitHubClient, GitHubConfig, ReleaseHost};
pub use guardrails::{GuardrailEngine, GuardrailId, GuardrailReport, GuardrailResult};
pub use phases::{BackflowPr, BackflowSync, PhaseExecutor, PhaseOutcome};
pub use presence::Presence;
pub use tagging::{GitTagBackend, Prerelease, PrereleaseKind, TagBackend};
pub use train::{TrainInitiator, TrainOutcome};
pub use version::{StampKind, StampTarget, VersionStamper};
pub use workflow::{CheckOutcome, ReleaseOutcome, ReleaseWorkflow};
