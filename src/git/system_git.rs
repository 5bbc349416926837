//! [`VersionControl`] backed by the system `git` executable.
//!
//! Every invocation runs through [`SystemGit::run`], which bounds the call with
//! the configured timeout and maps non-zero exits to [`GitError::CommandFailed`].

use crate::error::{GitError, Result};
use crate::git::{CommitInfo, VersionControl};
use crate::presence::Presence;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Git backend using the system git executable
#[derive(Debug, Clone)]
pub struct SystemGit {
    /// Repository working directory
    work_dir: PathBuf,
    /// Remote used for fetch/push
    remote: String,
    /// Per-command time budget
    timeout: Duration,
}

impl SystemGit {
    /// Open a repository, failing early when git is not installed
    pub fn open(work_dir: impl AsRef<Path>, remote: &str, timeout: Duration) -> Result<Self> {
        which::which("git").map_err(|_| GitError::NotInstalled)?;
        Ok(Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            remote: remote.to_string(),
            timeout,
        })
    }

    /// Remote name used for pushes
    pub fn remote(&self) -> &str {
        &self.remote
    }

    async fn output(&self, args: &[&str]) -> Result<Output> {
        let command = format!("git {}", args.join(" "));
        log::debug!("running {command}");

        let child = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(GitError::SpawnFailed {
                command,
                reason: e.to_string(),
            }
            .into()),
            Err(_) => Err(GitError::Timeout {
                command,
                seconds: self.timeout.as_secs(),
            }
            .into()),
        }
    }

    /// Run git and return trimmed stdout, erroring on non-zero exit
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VersionControl for SystemGit {
    async fn fetch_tags(&self) -> Result<()> {
        self.run(&["fetch", &self.remote, "--tags", "--force", "--prune-tags"])
            .await
            .map(|_| ())
    }

    async fn list_tags(&self, pattern: &str) -> Result<Vec<String>> {
        let stdout = self.run(&["tag", "--list", pattern]).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn create_tag(&self, name: &str, target: Option<&str>, force: bool) -> Result<()> {
        let mut args = vec!["tag"];
        if force {
            args.push("--force");
        }
        args.push(name);
        if let Some(target) = target {
            args.push(target);
        }
        self.run(&args).await.map(|_| ())
    }

    async fn delete_tag(&self, name: &str) -> Result<()> {
        self.run(&["tag", "--delete", name]).await.map(|_| ())
    }

    async fn push_tag(&self, name: &str, force: bool) -> Result<()> {
        let refspec = format!("refs/tags/{name}:refs/tags/{name}");
        let mut args = vec!["push", self.remote.as_str()];
        if force {
            args.push("--force");
        }
        args.push(&refspec);
        self.run(&args).await.map(|_| ())
    }

    async fn create_branch(&self, name: &str, start_point: &str) -> Result<()> {
        self.run(&["branch", name, start_point]).await.map(|_| ())
    }

    async fn delete_local_branch(&self, name: &str) -> Result<()> {
        self.run(&["branch", "-D", name]).await.map(|_| ())
    }

    async fn delete_remote_branch(&self, name: &str) -> Result<()> {
        self.run(&["push", &self.remote, "--delete", name])
            .await
            .map(|_| ())
    }

    async fn push_branch(&self, name: &str) -> Result<()> {
        let refspec = format!("refs/heads/{name}:refs/heads/{name}");
        self.run(&["push", &self.remote, &refspec]).await.map(|_| ())
    }

    async fn push_head_to(&self, branch: &str) -> Result<()> {
        let refspec = format!("HEAD:refs/heads/{branch}");
        self.run(&["push", &self.remote, &refspec]).await.map(|_| ())
    }

    async fn local_branch_exists(&self, name: &str) -> Presence {
        let reference = format!("refs/heads/{name}");
        match self.output(&["show-ref", "--verify", "--quiet", &reference]).await {
            // show-ref exits 1 for a missing ref and >1 for real failures
            Ok(output) => match output.status.code() {
                Some(0) => Presence::Exists,
                Some(1) => Presence::NotFound,
                _ => Presence::QueryFailed(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            },
            Err(e) => Presence::QueryFailed(e.to_string()),
        }
    }

    async fn remote_branch_exists(&self, name: &str) -> Presence {
        let reference = format!("refs/heads/{name}");
        match self
            .output(&["ls-remote", "--exit-code", "--heads", &self.remote, &reference])
            .await
        {
            // --exit-code makes ls-remote exit 2 when no ref matched
            Ok(output) => match output.status.code() {
                Some(0) => Presence::Exists,
                Some(2) => Presence::NotFound,
                _ => Presence::QueryFailed(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            },
            Err(e) => Presence::QueryFailed(e.to_string()),
        }
    }

    async fn resolve_commit(&self, reference: &str) -> Result<Option<String>> {
        let spec = format!("{reference}^{{commit}}");
        let output = self.output(&["rev-parse", "--verify", "--quiet", &spec]).await?;
        if !output.status.success() {
            return Ok(None);
        }
        let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!sha.is_empty()).then_some(sha))
    }

    async fn describe_latest_tag(
        &self,
        pattern: &str,
        exclude: Option<&str>,
    ) -> Result<Option<String>> {
        let mut args = vec!["describe", "--tags", "--abbrev=0", "--match", pattern];
        if let Some(exclude) = exclude {
            args.push("--exclude");
            args.push(exclude);
        }
        let output = self.output(&args).await?;
        if !output.status.success() {
            // No matching tag is a normal answer, not a failure
            return Ok(None);
        }
        let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!tag.is_empty()).then_some(tag))
    }

    async fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<Option<CommitInfo>> {
        if paths.is_empty() {
            return Ok(None);
        }

        let mut add_args: Vec<String> = vec!["add".into(), "--".into()];
        add_args.extend(paths.iter().map(|p| p.display().to_string()));
        let add_refs: Vec<&str> = add_args.iter().map(String::as_str).collect();
        self.run(&add_refs).await?;

        // `diff --cached --quiet` exits 0 when nothing is staged
        let staged = self.output(&["diff", "--cached", "--quiet"]).await?;
        if staged.status.success() {
            log::info!("no staged changes, skipping commit");
            return Ok(None);
        }

        self.run(&["commit", "-m", message]).await?;
        let hash = self.run(&["rev-parse", "HEAD"]).await?;
        Ok(Some(CommitInfo {
            hash,
            message: message.to_string(),
        }))
    }

    async fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.run(&["config", "user.name", name]).await?;
        self.run(&["config", "user.email", email]).await?;
        Ok(())
    }
}
