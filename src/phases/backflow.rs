//! Backflow: carry a stable release back into every open release train.

use crate::branch::{BranchKind, ReleaseVersion, classify};
use crate::error::Result;
use crate::github::{DraftIntent, NewPullRequest, ReleaseHost};
use crate::presence::Presence;
use serde::Serialize;

/// A backflow pull request that was opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackflowPr {
    /// Dev branch receiving the changes
    pub branch: String,
    /// PR number
    pub number: u64,
    /// PR page URL
    pub url: String,
}

/// Opens `main -> dev/vX.Y.Z` draft pull requests for open trains
#[derive(Debug)]
pub struct BackflowSync<'a, H> {
    host: &'a H,
    main_branch: &'a str,
    label: &'a str,
}

impl<'a, H: ReleaseHost> BackflowSync<'a, H> {
    /// Create a backflow step from `main_branch`, labeling PRs with `label`
    pub fn new(host: &'a H, main_branch: &'a str, label: &'a str) -> Self {
        Self {
            host,
            main_branch,
            label,
        }
    }

    /// Open backflow PRs for every unpublished train.
    ///
    /// Failures are logged per train and never abort the others.
    pub async fn run(&self, repo: &str, released: &ReleaseVersion) -> Vec<BackflowPr> {
        let releases = match self.host.list_releases(repo).await {
            Ok(releases) => releases,
            Err(e) => {
                log::warn!("backflow skipped: could not list release trains: {e}");
                return Vec::new();
            }
        };

        let trains: Vec<(DraftIntent, ReleaseVersion)> = releases
            .iter()
            .filter_map(DraftIntent::from_release)
            .filter_map(|intent| match classify(&intent.target_branch) {
                BranchKind::Dev(version) if &version != released => Some((intent, version)),
                _ => None,
            })
            .collect();
        log::info!("{} open release train(s) to backflow into", trains.len());

        let mut opened = Vec::new();
        for (intent, train) in trains {
            match self.sync_train(repo, released, &intent.target_branch, &train).await {
                Ok(Some(pr)) => opened.push(pr),
                Ok(None) => {}
                Err(e) => log::warn!("backflow into {} failed: {e}", intent.target_branch),
            }
        }
        opened
    }

    async fn sync_train(
        &self,
        repo: &str,
        released: &ReleaseVersion,
        branch: &str,
        train: &ReleaseVersion,
    ) -> Result<Option<BackflowPr>> {
        match self.host.branch_exists(repo, branch).await {
            Presence::Exists => {}
            Presence::NotFound => {
                log::warn!("{branch} no longer exists, skipping backflow for {train}");
                return Ok(None);
            }
            Presence::QueryFailed(reason) => {
                log::warn!("could not check {branch} ({reason}), skipping backflow for {train}");
                return Ok(None);
            }
        }

        let open = self.host.list_pull_requests(repo, self.main_branch, branch).await?;
        if let Some(existing) = open.first() {
            log::info!("backflow into {branch} already open: {}", existing.html_url);
            return Ok(None);
        }

        let pull = NewPullRequest {
            title: format!("Backflow {released} into {train}"),
            head: self.main_branch.to_string(),
            base: branch.to_string(),
            body: backflow_body(released, train, self.main_branch, branch),
            draft: true,
        };
        let created = self.host.create_pull_request(repo, &pull).await?;
        log::info!("opened backflow #{} into {branch}", created.number);

        if let Err(e) = self
            .host
            .add_labels(repo, created.number, &[self.label.to_string()])
            .await
        {
            log::warn!("could not label backflow #{}: {e}", created.number);
        }

        Ok(Some(BackflowPr {
            branch: branch.to_string(),
            number: created.number,
            url: created.html_url,
        }))
    }
}

fn backflow_body(released: &ReleaseVersion, train: &ReleaseVersion, main: &str, branch: &str) -> String {
    format!(
        "Brings the changes released in {released} back into the {train} train.\n\n\
         Scope: every commit on `{main}` up to {released} that is not yet on `{branch}`, \
         including fixes made during stabilization.\n\n\
         This pull request is opened as a draft. If it has conflicts, resolve them manually \
         on a local checkout of `{branch}` (merge `{main}`, fix, push), then mark it ready for review."
    )
}
