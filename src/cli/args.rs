//! Command line argument parsing and validation.

use super::OutputManager;
use crate::branch::ReleaseVersion;
use crate::config::{EnvConfig, FlowConfig};
use crate::error::Result;
use crate::tagging::PrereleaseKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Guarded alpha/beta/stable release trains
#[derive(Parser, Debug)]
#[command(
    name = "release_flow",
    version,
    about = "Guarded alpha/beta/stable release trains on top of git and GitHub releases",
    long_about = "Runs the release workflow for a merged pull request.

Branch conventions:
  dev/vX.Y.Z      alpha prereleases (feature and fix work)
  release/vX.Y.Z  beta prereleases (fixes only)
  main            stable release, then backflow into open trains

Usage:
  release_flow start-train 1.3.0
  release_flow merge --event $GITHUB_EVENT_PATH
  release_flow check --event event.json --json"
)]
pub struct Args {
    /// Command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to release-flow.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Repository as owner/name
    #[arg(long, global = true, env = "GITHUB_REPOSITORY", value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Repository working directory
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub workdir: PathBuf,

    /// Print the result record as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the release for a merged pull request
    Merge {
        /// pull_request event document
        #[arg(long, env = "GITHUB_EVENT_PATH", value_name = "PATH")]
        event: Option<PathBuf>,
    },

    /// Resolve the release phase and evaluate guardrails without side effects
    Check {
        /// pull_request event document
        #[arg(long, env = "GITHUB_EVENT_PATH", value_name = "PATH")]
        event: Option<PathBuf>,
    },

    /// Create dev/vX.Y.Z and its draft release intent
    StartTrain {
        /// Version to start, e.g. 1.3.0
        #[arg(value_name = "VERSION")]
        version: String,

        /// Base reference (default: latest stable tag, else the main branch)
        #[arg(long, value_name = "REF")]
        base: Option<String>,
    },

    /// Print the next prerelease tag for a version
    NextPrerelease {
        /// Version, e.g. 1.3.0
        #[arg(value_name = "VERSION")]
        version: String,

        /// Prerelease channel
        #[arg(long, value_enum, default_value_t = KindArg::Alpha)]
        kind: KindArg,
    },

    /// Write a version into the configured project files
    Stamp {
        /// Base version, e.g. 1.3.0
        #[arg(value_name = "VERSION")]
        version: String,

        /// Prerelease label, e.g. beta2
        #[arg(long, value_name = "LABEL")]
        pre: Option<String>,
    },
}

impl Command {
    /// Subcommand name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Merge { .. } => "merge",
            Command::Check { .. } => "check",
            Command::StartTrain { .. } => "start-train",
            Command::NextPrerelease { .. } => "next-prerelease",
            Command::Stamp { .. } => "stamp",
        }
    }
}

/// Prerelease channel argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// alpha
    Alpha,
    /// beta
    Beta,
}

impl From<KindArg> for PrereleaseKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Alpha => PrereleaseKind::Alpha,
            KindArg::Beta => PrereleaseKind::Beta,
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(repo) = &self.repo
            && !is_full_name(repo)
        {
            return Err(format!("Invalid repository '{repo}'. Expected: owner/name"));
        }

        match &self.command {
            Command::StartTrain { version, .. }
            | Command::NextPrerelease { version, .. }
            | Command::Stamp { version, .. } => {
                if ReleaseVersion::parse(version).is_none() {
                    return Err(format!("Invalid version '{version}'. Expected: MAJOR.MINOR.PATCH"));
                }
            }
            Command::Merge { .. } | Command::Check { .. } => {}
        }

        if let Command::Stamp { pre: Some(label), .. } = &self.command
            && (label.is_empty() || !label.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(format!("Invalid prerelease label '{label}'. Use letters and digits, e.g. beta2"));
        }

        Ok(())
    }
}

fn is_full_name(repo: &str) -> bool {
    matches!(repo.split_once('/'), Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/'))
}

/// Configuration derived from arguments, environment and config file
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: OutputManager,
    /// Print result records as JSON
    pub json: bool,
    /// Repository working directory
    pub workdir: PathBuf,
    /// Repository from `--repo` or the environment
    pub repository: Option<String>,
    /// Environment snapshot
    pub env: EnvConfig,
    /// Settings from release-flow.toml
    pub flow: FlowConfig,
}

impl RuntimeConfig {
    /// Combine parsed arguments with the environment snapshot and config file
    pub fn new(args: &Args, env: EnvConfig) -> Result<Self> {
        let flow = FlowConfig::load(&args.workdir, args.config.as_deref())?;
        Ok(Self {
            output: OutputManager::new(args.quiet || args.json),
            json: args.json,
            workdir: args.workdir.clone(),
            repository: args.repo.clone().or_else(|| env.repository.clone()),
            env,
            flow,
        })
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if progress output is suppressed
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parses_subcommands_and_global_flags() {
        let args = parse(&["release_flow", "start-train", "1.3.0", "--base", "v1.2.0", "--json", "--repo", "acme/app"]);
        assert!(args.json);
        assert_eq!(args.repo.as_deref(), Some("acme/app"));
        assert!(matches!(
            args.command,
            Command::StartTrain { ref version, base: Some(ref base) } if version == "1.3.0" && base == "v1.2.0"
        ));
        assert!(args.validate().is_ok());

        let args = parse(&["release_flow", "next-prerelease", "1.0.0", "--kind", "beta"]);
        assert!(matches!(args.command, Command::NextPrerelease { kind: KindArg::Beta, .. }));
    }

    #[test]
    fn rejects_bad_versions_and_repositories() {
        assert!(parse(&["release_flow", "stamp", "1.0"]).validate().is_err());
        assert!(parse(&["release_flow", "stamp", "1.0.0", "--pre", "beta.2"]).validate().is_err());
        assert!(parse(&["release_flow", "stamp", "v1.0.0", "--pre", "beta2"]).validate().is_ok());
        assert!(parse(&["release_flow", "check", "--repo", "acme"]).validate().is_err());
    }
}
