//! Guardrail engine: G1 through G5 in fixed order, stopping at the first failure.

mod rules;

pub use rules::{
    GuardrailId, GuardrailResult, ci_status, draft_intent_exists, feature_branch_freeze,
    fixes_only, global_freeze,
};

use crate::config::{CiPolicy, FreezeConfig};
use crate::context::ReleaseContext;
use crate::error::GuardrailFailure;
use crate::github::ReleaseHost;
use crate::presence::Presence;
use serde::Serialize;

/// Aggregate outcome of a guardrail run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardrailReport {
    /// No guardrail failed
    pub passed: bool,
    /// Guardrails that ran and passed, in order
    pub validated: Vec<GuardrailId>,
    /// The failing guardrail, if any
    pub failed: Option<GuardrailResult>,
    /// Every guardrail evaluated up to and including the failure
    pub details: Vec<GuardrailResult>,
}

impl GuardrailReport {
    fn from_details(details: Vec<GuardrailResult>) -> Self {
        let failed = details.iter().find(|r| !r.passed).cloned();
        let validated = details
            .iter()
            .filter(|r| r.passed && !r.skipped)
            .map(|r| r.id)
            .collect();
        Self {
            passed: failed.is_none(),
            validated,
            failed,
            details,
        }
    }

    /// `Err` carrying the failed guardrail, if any
    pub fn into_result(self) -> std::result::Result<Self, GuardrailFailure> {
        match &self.failed {
            Some(failure) => Err(GuardrailFailure {
                id: failure.id.to_string(),
                name: failure.name.clone(),
                message: failure.message.clone(),
            }),
            None => Ok(self),
        }
    }
}

/// Evaluates guardrails against a context.
///
/// External lookups happen only for guardrails that apply and need them.
#[derive(Debug)]
pub struct GuardrailEngine<'a, H> {
    host: &'a H,
    freeze: FreezeConfig,
    ci: CiPolicy,
}

impl<'a, H: ReleaseHost> GuardrailEngine<'a, H> {
    /// Create an engine with explicit freeze flags and CI policy
    pub fn new(host: &'a H, freeze: FreezeConfig, ci: CiPolicy) -> Self {
        Self { host, freeze, ci }
    }

    /// Evaluate G1..G5; stops after the first failure
    pub async fn evaluate(&self, context: &ReleaseContext) -> GuardrailReport {
        let mut details = Vec::with_capacity(GuardrailId::ALL.len());

        for id in GuardrailId::ALL {
            let result = if id.applies_to(context.phase) {
                self.evaluate_one(id, context).await
            } else {
                GuardrailResult::skip(id, context.phase)
            };

            if result.skipped {
                log::debug!("{id} skipped: {}", result.message);
            } else if result.passed {
                log::info!("{id} ({}) passed: {}", result.name, result.message);
            } else {
                log::warn!("{id} ({}) failed: {}", result.name, result.message);
            }

            let failed = !result.passed;
            details.push(result);
            if failed {
                break;
            }
        }

        GuardrailReport::from_details(details)
    }

    async fn evaluate_one(&self, id: GuardrailId, context: &ReleaseContext) -> GuardrailResult {
        match id {
            GuardrailId::G1 => draft_intent_exists(context),
            GuardrailId::G2 => {
                let presence = if context.source_kind.is_feature() {
                    self.host
                        .branch_exists(&context.repository, &context.version.release_branch())
                        .await
                } else {
                    Presence::NotFound
                };
                if let Presence::QueryFailed(reason) = &presence {
                    log::warn!("release branch lookup failed: {reason}");
                }
                feature_branch_freeze(context, &presence)
            }
            GuardrailId::G3 => fixes_only(context),
            GuardrailId::G4 => match context.pull_request {
                None => ci_status(Err("no pull request number in the event"), &self.ci),
                Some(number) => match self.host.pull_request_checks(&context.repository, number).await {
                    Ok(checks) => ci_status(Ok(checks.as_slice()), &self.ci),
                    Err(e) => {
                        log::warn!("CI status query failed: {e}");
                        let reason = format!("check-run query failed: {e}");
                        ci_status(Err(reason.as_str()), &self.ci)
                    }
                },
            },
            GuardrailId::G5 => global_freeze(context, self.freeze),
        }
    }
}
