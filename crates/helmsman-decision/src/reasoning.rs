//! Human-readable reasoning for decisions
//!
//! Pure formatting. Nothing here touches the policy or the journal.

use helmsman_common::InternalState;

use crate::guard::Enforcement;
use crate::policy::Selection;
use crate::validator::ValidationFailure;

/// Prefix shared by every fault fallback
pub const INTERNAL_FAULT_PREFIX: &str = "internal error, safe fallback applied";

/// Reasoning for a payload the validator rejected
pub fn contract_violation(failure: &ValidationFailure) -> String {
    format!(
        "contract violation ({}): {}; no action taken",
        failure.code(),
        failure
    )
}

/// Reasoning for a fault caught at the bridge
pub fn internal_fault(detail: &str) -> String {
    format!("{}: {}", INTERNAL_FAULT_PREFIX, detail)
}

/// Reasoning for a decision that went through the full pipeline
pub fn explain(state: &InternalState, selection: &Selection, enforcement: &Enforcement) -> String {
    let mut out = format!(
        "{} in {} is {} (latency {}, failures {}). ",
        state.app_id,
        state.env,
        state.health_band,
        state.latency_bucket,
        state.recent_failures_bucket
    );

    if selection.seen {
        out.push_str(&format!(
            "Policy chose {} by {} (confidence {:.2}).",
            selection.action,
            selection.mode.as_str(),
            selection.confidence
        ));
    } else {
        out.push_str(&format!(
            "No experience for this state yet; policy chose {} by {} (confidence {:.2}).",
            selection.action,
            selection.mode.as_str(),
            selection.confidence
        ));
    }

    if let Some(reason) = enforcement.reason() {
        out.push_str(" Safety guard: ");
        out.push_str(&reason);
        out.push('.');
    }

    out
}
