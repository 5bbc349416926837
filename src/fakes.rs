//! In-memory collaborators for tests.
//!
//! [`FakeGit`], [`FakeHost`] and [`FakeTagger`] keep their state behind a
//! `Mutex` and record every call as a short string (`"push_tag v1 force"`,
//! `"create_release v1.2.0"`), so tests can assert both outcomes and
//! ordering. Any call whose record starts with a prefix registered through
//! `fail_on` returns an error (or `Presence::QueryFailed` for existence
//! queries). Fakes attached to one [`CallJournal`] also append to it, which
//! orders calls across collaborators.

use crate::branch::ReleaseVersion;
use crate::error::{GitError, HostingError, Result};
use crate::git::{CommitInfo, VersionControl};
use crate::github::{CheckRun, NewPullRequest, NewRelease, PullRequest, Release, ReleaseHost, ReleaseUpdate};
use crate::presence::Presence;
use crate::tagging::{PrereleaseKind, TagBackend, next_sequence};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Call log shared by several fakes
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallJournal {
    /// Calls from every attached fake, in order
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// Index of the first entry equal to `call`
    pub fn position(&self, call: &str) -> Option<usize> {
        lock(&self.entries).iter().position(|c| c == call)
    }

    fn push(&self, call: &str) {
        lock(&self.entries).push(call.to_string());
    }
}

fn journal_push(journal: &Option<CallJournal>, call: &str) {
    if let Some(journal) = journal {
        journal.push(call);
    }
}

/// Match `text` against a `git tag --list` style pattern
fn tag_matches(pattern: &str, text: &str) -> Result<bool> {
    let pattern = glob::Pattern::new(pattern).map_err(|e| GitError::CommandFailed {
        command: format!("git tag --list {pattern}"),
        stderr: e.to_string(),
    })?;
    Ok(pattern.matches(text))
}

#[derive(Debug, Default)]
struct GitState {
    tags: BTreeSet<String>,
    local_branches: BTreeSet<String>,
    remote_branches: BTreeSet<String>,
    refs: BTreeMap<String, String>,
    latest_stable: Option<String>,
    failures: Vec<String>,
    calls: Vec<String>,
    commits: usize,
}

/// In-memory [`VersionControl`]
#[derive(Debug)]
pub struct FakeGit {
    state: Mutex<GitState>,
    journal: Option<CallJournal>,
}

impl Default for FakeGit {
    /// A repository where `main` and `origin/main` resolve
    fn default() -> Self {
        let mut state = GitState::default();
        state.refs.insert("main".into(), "a1b2c3d4e5f6".into());
        state.refs.insert("origin/main".into(), "a1b2c3d4e5f6".into());
        state.local_branches.insert("main".into());
        state.remote_branches.insert("main".into());
        Self {
            state: Mutex::new(state),
            journal: None,
        }
    }
}

impl FakeGit {
    /// Seed existing tags; each resolves to a commit
    pub fn with_tags(self, tags: &[&str]) -> Self {
        {
            let mut state = lock(&self.state);
            for tag in tags {
                state.tags.insert(tag.to_string());
                state.refs.insert(tag.to_string(), format!("commit-of-{tag}"));
            }
        }
        self
    }

    /// Seed a local branch
    pub fn with_local_branch(self, name: &str) -> Self {
        lock(&self.state).local_branches.insert(name.to_string());
        self
    }

    /// Seed a remote branch
    pub fn with_remote_branch(self, name: &str) -> Self {
        lock(&self.state).remote_branches.insert(name.to_string());
        self
    }

    /// Make a ref resolve to `sha`
    pub fn with_ref(self, name: &str, sha: &str) -> Self {
        lock(&self.state).refs.insert(name.to_string(), sha.to_string());
        self
    }

    /// Result of `describe_latest_tag`
    pub fn with_latest_stable(self, tag: &str) -> Self {
        {
            let mut state = lock(&self.state);
            state.latest_stable = Some(tag.to_string());
            state.refs.insert(tag.to_string(), format!("commit-of-{tag}"));
        }
        self
    }

    /// Fail every call whose record starts with `prefix`
    pub fn fail_on(self, prefix: &str) -> Self {
        lock(&self.state).failures.push(prefix.to_string());
        self
    }

    /// Also record calls into `journal`
    pub fn with_journal(mut self, journal: &CallJournal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    /// Recorded calls, in order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Current tags
    pub fn tags(&self) -> Vec<String> {
        lock(&self.state).tags.iter().cloned().collect()
    }

    /// Current local branches
    pub fn local_branches(&self) -> Vec<String> {
        lock(&self.state).local_branches.iter().cloned().collect()
    }

    /// Current remote branches
    pub fn remote_branches(&self) -> Vec<String> {
        lock(&self.state).remote_branches.iter().cloned().collect()
    }

    fn record(&self, call: String) -> std::result::Result<MutexGuard<'_, GitState>, String> {
        journal_push(&self.journal, &call);
        let mut state = lock(&self.state);
        let failing = state.failures.iter().any(|prefix| call.starts_with(prefix.as_str()));
        state.calls.push(call.clone());
        if failing { Err(call) } else { Ok(state) }
    }

    fn enter(&self, call: String) -> Result<MutexGuard<'_, GitState>> {
        self.record(call).map_err(|command| {
            GitError::CommandFailed {
                command,
                stderr: "injected failure".to_string(),
            }
            .into()
        })
    }

    fn presence(&self, call: String, check: impl FnOnce(&GitState) -> bool) -> Presence {
        match self.record(call) {
            Ok(state) => Presence::from_bool(check(&*state)),
            Err(_) => Presence::QueryFailed("injected failure".to_string()),
        }
    }
}

fn flag(force: bool) -> &'static str {
    if force { " force" } else { "" }
}

impl VersionControl for FakeGit {
    async fn fetch_tags(&self) -> Result<()> {
        self.enter("fetch_tags".to_string()).map(|_| ())
    }

    async fn list_tags(&self, pattern: &str) -> Result<Vec<String>> {
        let state = self.enter(format!("list_tags {pattern}"))?;
        let mut tags = Vec::new();
        for tag in &state.tags {
            if tag_matches(pattern, tag)? {
                tags.push(tag.clone());
            }
        }
        Ok(tags)
    }

    async fn create_tag(&self, name: &str, target: Option<&str>, force: bool) -> Result<()> {
        let mut state = self.enter(format!("create_tag {name}{}", flag(force)))?;
        if !force && state.tags.contains(name) {
            return Err(GitError::CommandFailed {
                command: format!("git tag {name}"),
                stderr: format!("fatal: tag '{name}' already exists"),
            }
            .into());
        }
        state.tags.insert(name.to_string());
        let sha = target.unwrap_or("HEAD").to_string();
        state.refs.insert(name.to_string(), sha);
        Ok(())
    }

    async fn delete_tag(&self, name: &str) -> Result<()> {
        let mut state = self.enter(format!("delete_tag {name}"))?;
        state.tags.remove(name);
        Ok(())
    }

    async fn push_tag(&self, name: &str, force: bool) -> Result<()> {
        self.enter(format!("push_tag {name}{}", flag(force))).map(|_| ())
    }

    async fn create_branch(&self, name: &str, start_point: &str) -> Result<()> {
        let mut state = self.enter(format!("create_branch {name} {start_point}"))?;
        state.local_branches.insert(name.to_string());
        Ok(())
    }

    async fn delete_local_branch(&self, name: &str) -> Result<()> {
        let mut state = self.enter(format!("delete_local_branch {name}"))?;
        state.local_branches.remove(name);
        Ok(())
    }

    async fn delete_remote_branch(&self, name: &str) -> Result<()> {
        let mut state = self.enter(format!("delete_remote_branch {name}"))?;
        state.remote_branches.remove(name);
        Ok(())
    }

    async fn push_branch(&self, name: &str) -> Result<()> {
        let mut state = self.enter(format!("push_branch {name}"))?;
        state.remote_branches.insert(name.to_string());
        Ok(())
    }

    async fn push_head_to(&self, branch: &str) -> Result<()> {
        self.enter(format!("push_head_to {branch}")).map(|_| ())
    }

    async fn local_branch_exists(&self, name: &str) -> Presence {
        self.presence(format!("local_branch_exists {name}"), |s| s.local_branches.contains(name))
    }

    async fn remote_branch_exists(&self, name: &str) -> Presence {
        self.presence(format!("remote_branch_exists {name}"), |s| s.remote_branches.contains(name))
    }

    async fn resolve_commit(&self, reference: &str) -> Result<Option<String>> {
        let state = self.enter(format!("resolve_commit {reference}"))?;
        Ok(state.refs.get(reference).cloned())
    }

    async fn describe_latest_tag(&self, pattern: &str, exclude: Option<&str>) -> Result<Option<String>> {
        let state = self.enter(format!("describe_latest_tag {pattern}"))?;
        let Some(latest) = &state.latest_stable else {
            return Ok(None);
        };
        let excluded = match exclude {
            Some(exclude) => tag_matches(exclude, latest)?,
            None => false,
        };
        Ok((tag_matches(pattern, latest)? && !excluded).then(|| latest.clone()))
    }

    async fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<Option<CommitInfo>> {
        let mut state = self.enter(format!("commit_paths {message}"))?;
        if paths.is_empty() {
            return Ok(None);
        }
        state.commits += 1;
        Ok(Some(CommitInfo {
            hash: format!("{:040x}", state.commits),
            message: message.to_string(),
        }))
    }

    async fn configure_identity(&self, name: &str, _email: &str) -> Result<()> {
        self.enter(format!("configure_identity {name}")).map(|_| ())
    }
}

#[derive(Debug, Default)]
struct HostState {
    releases: Vec<Release>,
    pulls: Vec<PullRequest>,
    branches: BTreeSet<String>,
    checks: Vec<CheckRun>,
    labels: Vec<(u64, Vec<String>)>,
    failures: Vec<String>,
    calls: Vec<String>,
    next_id: u64,
}

/// In-memory [`ReleaseHost`]
#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
    journal: Option<CallJournal>,
}

fn release(id: u64, tag: &str, target: &str, draft: bool, url: String) -> Release {
    Release {
        id,
        draft,
        tag_name: tag.to_string(),
        name: Some(tag.to_string()),
        body: None,
        target_commitish: target.to_string(),
        prerelease: false,
        html_url: url,
        created_at: None,
    }
}

impl FakeHost {
    /// Seed an unpublished release
    pub fn with_draft(self, id: u64, tag: &str, target: &str, url: &str) -> Self {
        lock(&self.state)
            .releases
            .push(release(id, tag, target, true, url.to_string()));
        self
    }

    /// Seed a published release
    pub fn with_published(self, tag: &str, target: &str) -> Self {
        {
            let mut state = lock(&self.state);
            state.next_id += 1;
            let id = 100_000 + state.next_id;
            let url = format!("https://github.test/releases/tag/{tag}");
            state.releases.push(release(id, tag, target, false, url));
        }
        self
    }

    /// Seed a branch
    pub fn with_branch(self, name: &str) -> Self {
        lock(&self.state).branches.insert(name.to_string());
        self
    }

    /// Seed an open pull request
    pub fn with_open_pr(self, head: &str, base: &str) -> Self {
        {
            let mut state = lock(&self.state);
            let number = 500 + state.pulls.len() as u64;
            state.pulls.push(PullRequest {
                number,
                head: head.to_string(),
                base: base.to_string(),
                html_url: format!("https://github.test/pull/{number}"),
            });
        }
        self
    }

    /// Check runs reported for any pull request
    pub fn with_checks(self, checks: &[(&str, Option<&str>)]) -> Self {
        lock(&self.state).checks = checks
            .iter()
            .map(|(name, conclusion)| CheckRun {
                name: name.to_string(),
                conclusion: conclusion.map(str::to_string),
            })
            .collect();
        self
    }

    /// Fail every call whose record starts with `prefix`
    pub fn fail_on(self, prefix: &str) -> Self {
        lock(&self.state).failures.push(prefix.to_string());
        self
    }

    /// Also record calls into `journal`
    pub fn with_journal(mut self, journal: &CallJournal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    /// Recorded calls, in order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Current releases
    pub fn releases(&self) -> Vec<Release> {
        lock(&self.state).releases.clone()
    }

    /// Current pull requests
    pub fn pull_requests(&self) -> Vec<PullRequest> {
        lock(&self.state).pulls.clone()
    }

    /// Labels applied, per pull request
    pub fn labels(&self) -> Vec<(u64, Vec<String>)> {
        lock(&self.state).labels.clone()
    }

    fn record(&self, call: String) -> std::result::Result<MutexGuard<'_, HostState>, String> {
        journal_push(&self.journal, &call);
        let mut state = lock(&self.state);
        let failing = state.failures.iter().any(|prefix| call.starts_with(prefix.as_str()));
        state.calls.push(call.clone());
        if failing { Err(call) } else { Ok(state) }
    }

    fn enter(&self, call: String) -> Result<MutexGuard<'_, HostState>> {
        self.record(call).map_err(|operation| {
            HostingError::Status {
                operation,
                status: 422,
                body: "injected failure".to_string(),
            }
            .into()
        })
    }
}

impl ReleaseHost for FakeHost {
    async fn list_releases(&self, _repo: &str) -> Result<Vec<Release>> {
        let state = self.enter("list_releases".to_string())?;
        Ok(state.releases.clone())
    }

    async fn create_release(&self, repo: &str, new: &NewRelease) -> Result<Release> {
        let mut state = self.enter(format!("create_release {}", new.tag_name))?;
        state.next_id += 1;
        let id = 100_000 + state.next_id;
        let url = if new.draft {
            format!("https://github.test/{repo}/releases/draft/{id}")
        } else {
            format!("https://github.test/{repo}/releases/tag/{}", new.tag_name)
        };
        let mut created = release(id, &new.tag_name, &new.target_commitish, new.draft, url);
        created.name = Some(new.name.clone());
        created.body = Some(new.body.clone());
        created.prerelease = new.prerelease;
        state.releases.push(created.clone());
        Ok(created)
    }

    async fn update_release(&self, _repo: &str, id: u64, update: &ReleaseUpdate) -> Result<Release> {
        let mut state = self.enter(format!("update_release {id}"))?;
        let release = state
            .releases
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| HostingError::Status {
                operation: format!("update release {id}"),
                status: 404,
                body: "Not Found".to_string(),
            })?;
        if let Some(draft) = update.draft {
            release.draft = draft;
        }
        if let Some(tag) = &update.tag_name {
            release.tag_name = tag.clone();
        }
        if let Some(target) = &update.target_commitish {
            release.target_commitish = target.clone();
        }
        Ok(release.clone())
    }

    async fn release_url_by_tag(&self, _repo: &str, tag: &str) -> Result<Option<String>> {
        let state = self.enter(format!("release_url_by_tag {tag}"))?;
        Ok(state
            .releases
            .iter()
            .find(|r| !r.draft && r.tag_name == tag)
            .map(|r| r.html_url.clone()))
    }

    async fn list_pull_requests(&self, _repo: &str, head: &str, base: &str) -> Result<Vec<PullRequest>> {
        let state = self.enter(format!("list_pull_requests {head} {base}"))?;
        Ok(state
            .pulls
            .iter()
            .filter(|p| p.head == head && p.base == base)
            .cloned()
            .collect())
    }

    async fn create_pull_request(&self, _repo: &str, pull: &NewPullRequest) -> Result<PullRequest> {
        let mut state = self.enter(format!("create_pull_request {} {}", pull.head, pull.base))?;
        let number = 500 + state.pulls.len() as u64;
        let created = PullRequest {
            number,
            head: pull.head.clone(),
            base: pull.base.clone(),
            html_url: format!("https://github.test/pull/{number}"),
        };
        state.pulls.push(created.clone());
        Ok(created)
    }

    async fn add_labels(&self, _repo: &str, number: u64, labels: &[String]) -> Result<()> {
        let mut state = self.enter(format!("add_labels {number} {}", labels.join(",")))?;
        state.labels.push((number, labels.to_vec()));
        Ok(())
    }

    async fn pull_request_checks(&self, _repo: &str, number: u64) -> Result<Vec<CheckRun>> {
        let state = self.enter(format!("pull_request_checks {number}"))?;
        Ok(state.checks.clone())
    }

    async fn branch_exists(&self, _repo: &str, branch: &str) -> Presence {
        match self.record(format!("branch_exists {branch}")) {
            Ok(state) => Presence::from_bool(state.branches.contains(branch)),
            Err(_) => Presence::QueryFailed("injected failure".to_string()),
        }
    }
}

/// In-memory [`TagBackend`] that records tag requests
#[derive(Debug, Default)]
pub struct FakeTagger {
    existing: Mutex<Vec<String>>,
    created: Mutex<Vec<String>>,
    journal: Option<CallJournal>,
}

impl FakeTagger {
    /// Seed existing tags used for numbering
    pub fn with_existing(self, tags: &[&str]) -> Self {
        lock(&self.existing).extend(tags.iter().map(|t| t.to_string()));
        self
    }

    /// Also record tag requests into `journal`
    pub fn with_journal(mut self, journal: &CallJournal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    /// Tags created so far, in order
    pub fn created(&self) -> Vec<String> {
        lock(&self.created).clone()
    }
}

impl TagBackend for FakeTagger {
    async fn create_tags(&self, tag: &str, stable: bool) -> Result<Vec<String>> {
        journal_push(&self.journal, &format!("create_tags {tag}{}", if stable { " stable" } else { "" }));
        let mut names = vec![tag.to_string()];
        if stable && let Some(version) = ReleaseVersion::parse(tag) {
            names.extend(version.smart_tags());
        }
        lock(&self.existing).push(tag.to_string());
        lock(&self.created).extend(names.iter().cloned());
        Ok(names)
    }

    async fn next_prerelease_number(&self, version: &ReleaseVersion, kind: PrereleaseKind) -> Result<u64> {
        Ok(next_sequence(lock(&self.existing).as_slice(), version, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_tags_like_git_tag_list() {
        let git = FakeGit::default().with_tags(&["v1.0.0", "v1.0.0-beta.1", "v1.0.0-alpha.1", "v2.0.0", "latest"]);

        assert_eq!(git.list_tags("v1.0.0-beta*").await.unwrap(), vec!["v1.0.0-beta.1".to_string()]);
        assert_eq!(git.list_tags("v1.0.0").await.unwrap(), vec!["v1.0.0".to_string()]);
        assert_eq!(git.list_tags("v[0-9]*").await.unwrap().len(), 4);
        assert!(git.list_tags("v[").await.is_err());
    }

    #[tokio::test]
    async fn describe_honors_match_and_exclude_patterns() {
        let stable = FakeGit::default().with_latest_stable("v1.2.0");
        assert_eq!(
            stable.describe_latest_tag("v[0-9]*", Some("*-*")).await.unwrap().as_deref(),
            Some("v1.2.0")
        );

        let prerelease = FakeGit::default().with_latest_stable("v1.3.0-beta.2");
        assert_eq!(prerelease.describe_latest_tag("v[0-9]*", Some("*-*")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors_and_query_failures() {
        let git = FakeGit::default().fail_on("push_branch").fail_on("remote_branch_exists");
        assert!(git.push_branch("dev/v1.0.0").await.is_err());
        assert!(matches!(
            git.remote_branch_exists("dev/v1.0.0").await,
            Presence::QueryFailed(_)
        ));
        assert_eq!(git.calls().len(), 2);
    }

    #[tokio::test]
    async fn journal_orders_calls_across_fakes() {
        let journal = CallJournal::default();
        let git = FakeGit::default().with_journal(&journal);
        let host = FakeHost::default().with_journal(&journal);
        let tagger = FakeTagger::default().with_journal(&journal);

        host.list_releases("acme/app").await.unwrap();
        tagger.create_tags("v1.0.0", true).await.unwrap();
        git.fetch_tags().await.unwrap();

        assert_eq!(
            journal.entries(),
            vec!["list_releases", "create_tags v1.0.0 stable", "fetch_tags"]
        );
        assert_eq!(host.calls(), vec!["list_releases".to_string()]);
        assert_eq!(journal.position("fetch_tags"), Some(2));
    }
}
