//! Promotion audit reconciliation.
//!
//! Decides whether a target server already reflects the desired environment
//! and, when it does not, which promotion from the source trail to replay.
//! Trails are newest-first, so "first matching event" means "most recent".

use bundlesync_core::{AppError, AppResult};

use crate::{AuditEvent, AuditSubjectType, AuditTrail, PromotionIntent, PromotionTimestamp};

#[cfg(test)]
mod tests;

/// Returns the environment of the most recent promotion event, in any state.
#[must_use]
pub fn latest_promotion_environment(trail: &AuditTrail) -> Option<&str> {
    trail
        .events()
        .iter()
        .find(|event| event.is_promotion())
        .and_then(|event| event.context.environment.as_deref())
}

/// Returns whether replication must be skipped to prevent a promotion loop.
///
/// Only the most recent promotion event counts. An absent or empty trail, or
/// one without promotions, never skips.
#[must_use]
pub fn should_skip(target_trail: Option<&AuditTrail>, desired_environment: &str) -> bool {
    target_trail
        .and_then(latest_promotion_environment)
        .is_some_and(|environment| environment == desired_environment)
}

/// Builds the promotion to replay from the source server's audit trail.
///
/// A leading external evidence event is skipped; the first completed
/// promotion after it supplies the repository scope and timestamp.
pub fn extract_intent(
    source_trail: &AuditTrail,
    environment: &str,
    project_key: &str,
) -> AppResult<PromotionIntent> {
    let promotion = completed_promotion(source_trail).ok_or_else(|| {
        AppError::NoCompletedPromotion(
            "source audit trail has no completed promotion".to_owned(),
        )
    })?;

    let raw_timestamp = promotion
        .context
        .promotion_created_millis
        .as_ref()
        .ok_or_else(|| {
            AppError::MalformedResponse(
                "completed promotion is missing promotion_created_millis".to_owned(),
            )
        })?;
    let source_timestamp = PromotionTimestamp::from_value(raw_timestamp);
    let replay_timestamp = source_timestamp.adjusted_for_copy();

    Ok(PromotionIntent {
        environment: environment.to_owned(),
        project_key: project_key.to_owned(),
        included_repository_keys: promotion.context.included_repository_keys.clone(),
        excluded_repository_keys: promotion.context.excluded_repository_keys.clone(),
        source_timestamp,
        replay_timestamp,
    })
}

fn completed_promotion(trail: &AuditTrail) -> Option<&AuditEvent> {
    let events = match trail.events().split_first() {
        Some((first, rest)) if first.subject_type == AuditSubjectType::ExternalEvidence => rest,
        _ => trail.events(),
    };

    events.iter().find(|event| event.is_completed_promotion())
}
