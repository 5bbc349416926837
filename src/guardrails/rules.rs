//! The five guardrails as pure predicates over resolved inputs.
//!
//! External state (remote branches, CI check runs) is looked up by the
//! engine and handed in, so every rule here is a plain function.

use crate::config::{CiPolicy, FreezeConfig};
use crate::context::{Phase, ReleaseContext};
use crate::github::CheckRun;
use crate::presence::Presence;
use serde::Serialize;
use std::fmt;

/// Guardrail identifiers, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GuardrailId {
    /// Draft intent exists
    G1,
    /// Feature-branch freeze once stabilization started
    G2,
    /// Only fixes during stabilization
    G3,
    /// CI status
    G4,
    /// Global feature freeze
    G5,
}

impl GuardrailId {
    /// All guardrails in evaluation order
    pub const ALL: [GuardrailId; 5] = [
        GuardrailId::G1,
        GuardrailId::G2,
        GuardrailId::G3,
        GuardrailId::G4,
        GuardrailId::G5,
    ];

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            GuardrailId::G1 => "Draft intent exists",
            GuardrailId::G2 => "Feature-branch freeze",
            GuardrailId::G3 => "Only fixes during stabilization",
            GuardrailId::G4 => "CI status",
            GuardrailId::G5 => "Global feature freeze",
        }
    }

    /// Whether the guardrail applies to a phase
    pub fn applies_to(&self, phase: Phase) -> bool {
        match self {
            GuardrailId::G1 => matches!(phase, Phase::Alpha | Phase::Beta | Phase::Stable),
            GuardrailId::G2 => phase == Phase::Alpha,
            GuardrailId::G3 => phase == Phase::Beta,
            GuardrailId::G4 => phase == Phase::Stable,
            GuardrailId::G5 => true,
        }
    }
}

impl fmt::Display for GuardrailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Outcome of one guardrail. A skipped guardrail counts as passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardrailResult {
    /// Identifier
    pub id: GuardrailId,
    /// Name
    pub name: String,
    /// Passed (always true when skipped)
    pub passed: bool,
    /// Not applicable to this phase
    pub skipped: bool,
    /// Explanation; on failure includes remediation
    pub message: String,
}

impl GuardrailResult {
    /// A passing result
    pub fn pass(id: GuardrailId, message: impl Into<String>) -> Self {
        Self::new(id, true, false, message)
    }

    /// A failing result
    pub fn fail(id: GuardrailId, message: impl Into<String>) -> Self {
        Self::new(id, false, false, message)
    }

    /// A result for a guardrail that does not apply
    pub fn skip(id: GuardrailId, phase: Phase) -> Self {
        Self::new(id, true, true, format!("not applicable to the {phase} phase"))
    }

    fn new(id: GuardrailId, passed: bool, skipped: bool, message: impl Into<String>) -> Self {
        Self {
            id,
            name: id.name().to_string(),
            passed,
            skipped,
            message: message.into(),
        }
    }
}

/// G1: an unpublished intent must declare the version
pub fn draft_intent_exists(context: &ReleaseContext) -> GuardrailResult {
    let tag = context.version.tag();
    match &context.intent {
        Some(intent) => GuardrailResult::pass(
            GuardrailId::G1,
            format!("draft intent for {tag} found: {}", intent.url),
        ),
        None => GuardrailResult::fail(
            GuardrailId::G1,
            format!(
                "No draft intent found for {tag}. Releases must be declared before work lands. \
                 Create a draft release with tag {tag} targeting {dev}, or run \
                 `release_flow start-train {bare}`, then re-run this workflow.",
                dev = context.version.dev_branch(),
                bare = context.version.bare(),
            ),
        ),
    }
}

/// G2: no feature merges into dev once `release/<version>` exists.
///
/// A failed existence query passes with an annotation.
pub fn feature_branch_freeze(context: &ReleaseContext, release_branch: &Presence) -> GuardrailResult {
    let id = GuardrailId::G2;
    if !context.source_kind.is_feature() {
        return GuardrailResult::pass(id, format!("{} is not a feature branch", context.source_branch));
    }

    let branch = context.version.release_branch();
    match release_branch {
        Presence::NotFound => {
            GuardrailResult::pass(id, format!("{branch} does not exist; feature work is still open"))
        }
        Presence::QueryFailed(reason) => GuardrailResult::pass(
            id,
            format!("could not check whether {branch} exists ({reason}); assuming feature work is open"),
        ),
        Presence::Exists => GuardrailResult::fail(
            id,
            format!(
                "{branch} already exists, so {version} is in stabilization and no longer accepts \
                 features. Retarget {source} to the next dev/v* branch, or if this is a fix, rename \
                 it to fix/* and merge it into {branch}.",
                version = context.version,
                source = context.source_branch,
            ),
        ),
    }
}

/// G3: only `fix/*` and `hotfix/*` may merge into a release branch
pub fn fixes_only(context: &ReleaseContext) -> GuardrailResult {
    let id = GuardrailId::G3;
    if context.source_kind.is_fix() {
        GuardrailResult::pass(id, format!("{} is a fix branch", context.source_branch))
    } else {
        GuardrailResult::fail(
            id,
            format!(
                "{source} is not a fix branch; {target} only accepts fix/* or hotfix/* merges during \
                 stabilization. Move feature work to the next dev/v* branch, or rename the branch \
                 to fix/<topic> if it only contains fixes.",
                source = context.source_branch,
                target = context.target_branch,
            ),
        )
    }
}

const ACCEPTED_CONCLUSIONS: [&str; 3] = ["success", "skipped", "neutral"];

/// G4: every CI check other than this tool's own must have succeeded.
///
/// `checks` is `Err(reason)` when the CI query failed or no pull request is
/// known; that passes with the reason as annotation.
pub fn ci_status(checks: std::result::Result<&[CheckRun], &str>, policy: &CiPolicy) -> GuardrailResult {
    let id = GuardrailId::G4;
    let checks = match checks {
        Ok(checks) => checks,
        Err(reason) => {
            return GuardrailResult::pass(id, format!("CI status not verified: {reason}"));
        }
    };

    let relevant: Vec<&CheckRun> = checks.iter().filter(|c| !policy.is_self_check(&c.name)).collect();

    let pending: Vec<&str> = relevant
        .iter()
        .filter(|c| c.conclusion.as_deref().is_none_or(|s| s.trim().is_empty()))
        .map(|c| c.name.as_str())
        .collect();
    if !pending.is_empty() {
        return GuardrailResult::fail(
            id,
            format!(
                "CI checks still running: {}. Wait for them to complete, then re-run this workflow.",
                pending.join(", ")
            ),
        );
    }

    let failing: Vec<String> = relevant
        .iter()
        .filter_map(|c| {
            let conclusion = c.conclusion.as_deref().unwrap_or_default();
            let accepted = ACCEPTED_CONCLUSIONS
                .iter()
                .any(|ok| conclusion.eq_ignore_ascii_case(ok));
            (!accepted).then(|| format!("{} ({conclusion})", c.name))
        })
        .collect();
    if !failing.is_empty() {
        return GuardrailResult::fail(
            id,
            format!(
                "CI checks did not succeed: {}. Fix the failures on the release branch and merge again.",
                failing.join(", ")
            ),
        );
    }

    GuardrailResult::pass(id, format!("{} CI check(s) passed", relevant.len()))
}

/// G5: while frozen, feature branches are rejected unless overridden
pub fn global_freeze(context: &ReleaseContext, freeze: FreezeConfig) -> GuardrailResult {
    let id = GuardrailId::G5;
    if !freeze.active {
        return GuardrailResult::pass(id, "no feature freeze in effect");
    }
    if freeze.override_active {
        return GuardrailResult::pass(id, "feature freeze bypassed by FREEZE_OVERRIDE");
    }
    if context.source_kind.is_feature() {
        return GuardrailResult::fail(
            id,
            format!(
                "A global feature freeze is in effect and {} is a feature branch. Wait for the \
                 freeze to be lifted, or have a maintainer set FREEZE_OVERRIDE=true for this run.",
                context.source_branch
            ),
        );
    }
    GuardrailResult::pass(id, format!("freeze in effect, {} is not a feature branch", context.source_branch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MergeEvent;
    use crate::github::DraftIntent;

    fn context(source: &str, target: &str, with_intent: bool) -> ReleaseContext {
        let event = MergeEvent::new(source, target).with_repository("acme/app");
        let mut context = ReleaseContext::from_event(&event, None).unwrap();
        if with_intent {
            context.intent = Some(DraftIntent {
                id: 1,
                tag_name: context.version.tag(),
                target_branch: context.version.dev_branch(),
                is_published: false,
                url: "https://example.test/draft/1".to_string(),
            });
        }
        context
    }

    fn check(name: &str, conclusion: Option<&str>) -> CheckRun {
        CheckRun {
            name: name.to_string(),
            conclusion: conclusion.map(str::to_string),
        }
    }

    #[test]
    fn applicability_matrix() {
        use GuardrailId::*;
        assert!(G1.applies_to(Phase::Alpha) && G1.applies_to(Phase::Stable));
        assert!(!G1.applies_to(Phase::Freeze));
        assert!(G2.applies_to(Phase::Alpha) && !G2.applies_to(Phase::Beta));
        assert!(G3.applies_to(Phase::Beta) && !G3.applies_to(Phase::Alpha));
        assert!(G4.applies_to(Phase::Stable) && !G4.applies_to(Phase::Beta));
        assert!(G5.applies_to(Phase::Freeze));
    }

    #[test]
    fn missing_intent_names_the_version() {
        let result = draft_intent_exists(&context("feature/x", "dev/v1.2.0", false));
        assert!(!result.passed);
        assert!(result.message.contains("No draft intent"));
        assert!(result.message.contains("v1.2.0"));
        assert!(draft_intent_exists(&context("feature/x", "dev/v1.2.0", true)).passed);
    }

    #[test]
    fn feature_freeze_depends_on_release_branch() {
        let ctx = context("feature/x", "dev/v1.2.0", true);
        assert!(feature_branch_freeze(&ctx, &Presence::NotFound).passed);
        assert!(!feature_branch_freeze(&ctx, &Presence::Exists).passed);

        let degraded = feature_branch_freeze(&ctx, &Presence::QueryFailed("timeout".into()));
        assert!(degraded.passed);
        assert!(degraded.message.contains("timeout"));

        let fix = context("fix/y", "dev/v1.2.0", true);
        assert!(feature_branch_freeze(&fix, &Presence::Exists).passed);
    }

    #[test]
    fn release_branch_accepts_fixes_only() {
        assert!(fixes_only(&context("fix/y", "release/v1.0.0", true)).passed);
        assert!(fixes_only(&context("hotfix/y", "release/v1.0.0", true)).passed);
        assert!(!fixes_only(&context("feature/y", "release/v1.0.0", true)).passed);
        assert!(!fixes_only(&context("chore/y", "release/v1.0.0", true)).passed);
    }

    #[test]
    fn ci_ignores_self_checks_and_accepts_benign_conclusions() {
        let policy = CiPolicy::new(Some("orchestrate".into()), &[]);
        let checks = [
            check("build", Some("SUCCESS")),
            check("lint", Some("skipped")),
            check("docs", Some("Neutral")),
            check("orchestrate", None),
            check("Release Flow", None),
        ];
        assert!(ci_status(Ok(&checks[..]), &policy).passed);
    }

    #[test]
    fn ci_fails_on_pending_or_failed_checks() {
        let policy = CiPolicy::default();
        let pending = ci_status(Ok(&[check("build", Some(""))][..]), &policy);
        assert!(!pending.passed);
        assert!(pending.message.contains("still running"));

        let failed = ci_status(
            Ok(&[check("build", Some("failure")), check("e2e", Some("cancelled"))][..]),
            &policy,
        );
        assert!(!failed.passed);
        assert!(failed.message.contains("build (failure)"));
        assert!(failed.message.contains("e2e (cancelled)"));
    }

    #[test]
    fn ci_query_failure_passes_with_annotation() {
        let result = ci_status(Err("HTTP 502"), &CiPolicy::default());
        assert!(result.passed);
        assert!(result.message.contains("HTTP 502"));
    }

    #[test]
    fn global_freeze_truth_table() {
        let feature = context("feature/x", "dev/v1.2.0", true);
        let fix = context("fix/y", "dev/v1.2.0", true);
        let frozen = FreezeConfig {
            active: true,
            override_active: false,
        };
        let bypassed = FreezeConfig {
            active: true,
            override_active: true,
        };

        assert!(global_freeze(&feature, FreezeConfig::default()).passed);
        assert!(!global_freeze(&feature, frozen).passed);
        assert!(global_freeze(&fix, frozen).passed);
        let bypass = global_freeze(&feature, bypassed);
        assert!(bypass.passed);
        assert!(bypass.message.contains("bypassed"));
    }
}
