//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod bundle;
mod promotion;
mod reconcile;

pub use audit::{AuditContext, AuditEvent, AuditEventStatus, AuditSubjectType, AuditTrail};
pub use bundle::ReleaseBundleRef;
pub use promotion::{
    PromotionIntent, PromotionTimestamp, REPLICATION_STATUS_AUTOMATED, REPLICATION_STATUS_PROPERTY,
};
pub use reconcile::{extract_intent, latest_promotion_environment, should_skip};
