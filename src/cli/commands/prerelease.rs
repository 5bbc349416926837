//! `next-prerelease` command.

use super::helpers::{emit, open_git};
use crate::branch::ReleaseVersion;
use crate::cli::RuntimeConfig;
use crate::error::{CliError, Result};
use crate::git::VersionControl;
use crate::tagging::{GitTagBackend, Prerelease, PrereleaseKind, TagBackend};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NextPrerelease {
    tag: String,
    number: u64,
    stamp_label: String,
}

/// Execute next-prerelease command
pub(super) async fn execute_next_prerelease(
    version: &str,
    kind: PrereleaseKind,
    config: &RuntimeConfig,
) -> Result<i32> {
    let version = ReleaseVersion::parse(version).ok_or_else(|| CliError::InvalidArguments {
        reason: format!("invalid version '{version}'"),
    })?;

    let git = open_git(config)?;
    if let Err(e) = git.fetch_tags().await {
        log::warn!("could not fetch tags, numbering from local tags: {e}");
    }

    let number = GitTagBackend::new(&git).next_prerelease_number(&version, kind).await?;
    let prerelease = Prerelease { kind, number };
    let record = NextPrerelease {
        tag: prerelease.tag_for(&version),
        number,
        stamp_label: prerelease.stamp_label(),
    };

    if !config.json {
        println!("{}", record.tag);
    }
    emit(config, &record)?;
    Ok(0)
}
