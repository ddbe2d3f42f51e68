use bundlesync_core::AppError;
use proptest::prelude::*;
use serde_json::json;

use super::{extract_intent, latest_promotion_environment, should_skip};
use crate::{
    AuditContext, AuditEvent, AuditEventStatus, AuditSubjectType, AuditTrail, PromotionTimestamp,
};

fn promotion(environment: &str, status: AuditEventStatus, millis: i64) -> AuditEvent {
    AuditEvent {
        subject_type: AuditSubjectType::Promotion,
        event_status: status,
        context: AuditContext {
            environment: Some(environment.to_owned()),
            promotion_created_millis: Some(json!(millis)),
            included_repository_keys: Vec::new(),
            excluded_repository_keys: Vec::new(),
        },
    }
}

fn non_promotion(subject_type: AuditSubjectType) -> AuditEvent {
    AuditEvent {
        subject_type,
        event_status: AuditEventStatus::Completed,
        context: AuditContext::default(),
    }
}

#[test]
fn empty_or_absent_target_trail_proceeds() {
    assert!(!should_skip(None, "PROD"));
    assert!(!should_skip(Some(&AuditTrail::default()), "PROD"));
}

#[test]
fn matching_latest_promotion_skips() {
    let trail = AuditTrail::new(vec![promotion("PROD", AuditEventStatus::Other, 10)]);
    assert!(should_skip(Some(&trail), "PROD"));
}

#[test]
fn only_latest_promotion_counts_for_loop_prevention() {
    let trail = AuditTrail::new(vec![
        non_promotion(AuditSubjectType::ExternalEvidence),
        promotion("QA", AuditEventStatus::Completed, 20),
        promotion("PROD", AuditEventStatus::Completed, 10),
    ]);

    assert_eq!(latest_promotion_environment(&trail), Some("QA"));
    assert!(!should_skip(Some(&trail), "PROD"));
    assert!(should_skip(Some(&trail), "QA"));
}

#[test]
fn extract_intent_replays_latest_completed_promotion() {
    let mut latest = promotion("STAGING", AuditEventStatus::Completed, 500);
    latest.context.included_repository_keys = vec!["repoA".to_owned()];
    let trail = AuditTrail::new(vec![
        non_promotion(AuditSubjectType::ExternalEvidence),
        latest,
        promotion("DEV", AuditEventStatus::Completed, 100),
    ]);

    let intent = extract_intent(&trail, "STAGING", "default");
    assert!(intent.is_ok());
    let intent = intent.unwrap_or_else(|_| unreachable!());

    assert_eq!(intent.environment, "STAGING");
    assert_eq!(intent.project_key, "default");
    assert_eq!(intent.included_repository_keys, vec!["repoA".to_owned()]);
    assert!(intent.excluded_repository_keys.is_empty());
    assert_eq!(intent.source_timestamp, PromotionTimestamp::Millis(500));
    assert_eq!(intent.replay_timestamp, PromotionTimestamp::Millis(501));
}

#[test]
fn extract_intent_skips_incomplete_promotions() {
    let trail = AuditTrail::new(vec![
        promotion("PROD", AuditEventStatus::Other, 300),
        promotion("QA", AuditEventStatus::Completed, 200),
    ]);

    let intent = extract_intent(&trail, "PROD", "default");
    assert!(intent.is_ok_and(|intent| intent.source_timestamp == PromotionTimestamp::Millis(200)));
}

#[test]
fn extract_intent_keeps_non_numeric_timestamp() {
    let mut event = promotion("QA", AuditEventStatus::Completed, 0);
    event.context.promotion_created_millis = Some(json!("not-a-number"));
    let trail = AuditTrail::new(vec![event]);

    let intent = extract_intent(&trail, "QA", "default");
    assert!(intent.is_ok());
    let intent = intent.unwrap_or_else(|_| unreachable!());

    assert_eq!(
        intent.replay_timestamp,
        PromotionTimestamp::Raw("not-a-number".to_owned())
    );
    assert_eq!(intent.replay_timestamp.to_string(), "not-a-number");
}

#[test]
fn extract_intent_requires_a_timestamp() {
    let mut event = promotion("QA", AuditEventStatus::Completed, 0);
    event.context.promotion_created_millis = None;
    let trail = AuditTrail::new(vec![event]);

    let result = extract_intent(&trail, "QA", "default");
    assert!(matches!(result, Err(AppError::MalformedResponse(_))));
}

#[test]
fn extract_intent_fails_without_completed_promotion() {
    let trail = AuditTrail::new(vec![
        non_promotion(AuditSubjectType::ExternalEvidence),
        promotion("QA", AuditEventStatus::Other, 10),
        non_promotion(AuditSubjectType::Other),
    ]);

    let result = extract_intent(&trail, "QA", "default");
    assert!(matches!(result, Err(AppError::NoCompletedPromotion(_))));
}

fn subject_type_strategy() -> impl Strategy<Value = AuditSubjectType> {
    prop_oneof![
        Just(AuditSubjectType::Promotion),
        Just(AuditSubjectType::ExternalEvidence),
        Just(AuditSubjectType::Other),
    ]
}

fn event_strategy() -> impl Strategy<Value = AuditEvent> {
    (
        subject_type_strategy(),
        any::<bool>(),
        prop_oneof![Just("DEV"), Just("QA"), Just("PROD")],
        0_i64..1_000_000,
    )
        .prop_map(|(subject_type, completed, environment, millis)| {
            let status = if completed {
                AuditEventStatus::Completed
            } else {
                AuditEventStatus::Other
            };
            let mut event = promotion(environment, status, millis);
            event.subject_type = subject_type;
            event
        })
}

fn non_promotion_strategy() -> impl Strategy<Value = AuditEvent> {
    prop_oneof![
        Just(AuditSubjectType::ExternalEvidence),
        Just(AuditSubjectType::Other),
    ]
    .prop_map(non_promotion)
}

proptest! {
    #[test]
    fn property_latest_promotion_in_desired_environment_skips(
        prefix in prop::collection::vec(non_promotion_strategy(), 0..4),
        suffix in prop::collection::vec(event_strategy(), 0..6),
        completed in any::<bool>(),
    ) {
        let status = if completed { AuditEventStatus::Completed } else { AuditEventStatus::Other };
        let mut events = prefix;
        events.push(promotion("PROD", status, 42));
        events.extend(suffix);

        prop_assert!(should_skip(Some(&AuditTrail::new(events)), "PROD"));
    }

    #[test]
    fn property_trail_without_matching_latest_promotion_proceeds(
        prefix in prop::collection::vec(non_promotion_strategy(), 0..4),
        latest in prop::option::of(prop_oneof![Just("DEV"), Just("QA")]),
        suffix in prop::collection::vec(event_strategy(), 0..6),
    ) {
        let mut events = prefix;
        if let Some(environment) = latest {
            events.push(promotion(environment, AuditEventStatus::Completed, 7));
            events.extend(suffix);
        }

        prop_assert!(!should_skip(Some(&AuditTrail::new(events)), "PROD"));
    }

    #[test]
    fn property_leading_external_evidence_is_ignored(
        rest in prop::collection::vec(event_strategy(), 0..8),
    ) {
        let mut with_evidence = vec![non_promotion(AuditSubjectType::ExternalEvidence)];
        with_evidence.extend(rest.clone());

        let expected = extract_intent(&AuditTrail::new(rest), "PROD", "default").ok();
        let actual = extract_intent(&AuditTrail::new(with_evidence), "PROD", "default").ok();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn property_trail_without_completed_promotion_fails(
        events in prop::collection::vec(event_strategy(), 0..8),
    ) {
        let events = events
            .into_iter()
            .filter(|event| !event.is_completed_promotion())
            .collect::<Vec<_>>();

        let result = extract_intent(&AuditTrail::new(events), "PROD", "default");
        prop_assert!(matches!(result, Err(AppError::NoCompletedPromotion(_))));
    }

    #[test]
    fn property_replay_timestamp_is_one_millisecond_later(millis in 0_i64..i64::MAX) {
        let trail = AuditTrail::new(vec![promotion("QA", AuditEventStatus::Completed, millis)]);

        let intent = extract_intent(&trail, "QA", "default");
        prop_assert!(intent.is_ok());
        let intent = intent.unwrap_or_else(|_| unreachable!());
        prop_assert_eq!(intent.replay_timestamp, PromotionTimestamp::Millis(millis + 1));
    }
}
