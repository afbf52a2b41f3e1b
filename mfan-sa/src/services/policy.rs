//! Content policy evaluation
//!
//! Decides once per session whether the result filter applies. Rules, first
//! match wins:
//! 1. Filtering globally disabled → exempt
//! 2. Owner → exempt
//! 3. Any of the principal's groups has filtering enabled → applies
//! 4. Otherwise → exempt

use mfan_common::models::{PolicyDecision, PolicySnapshot, Principal};
use tracing::debug;

pub fn evaluate(principal: &Principal, snapshot: &PolicySnapshot) -> PolicyDecision {
    let decision = if snapshot.global_filter_disabled {
        PolicyDecision::exempt("content filter globally disabled")
    } else if principal.is_owner() {
        PolicyDecision::exempt("owner is exempt from content filtering")
    } else if let Some(group) = snapshot.any_group_filters(&principal.groups) {
        PolicyDecision::applies(format!("group '{}' requires content filtering", group))
    } else {
        PolicyDecision::exempt("no group requires content filtering")
    };

    debug!(
        user = %principal.username,
        applies = decision.applies,
        reason = %decision.reason,
        "Content policy evaluated"
    );
    decision
}
