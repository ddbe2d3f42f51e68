use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Lifecycle subject recorded by one audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditSubjectType {
    /// Release bundle promotion to an environment.
    Promotion,
    /// Evidence attached to the bundle by an external system.
    ExternalEvidence,
    /// Any other lifecycle subject.
    #[serde(other)]
    Other,
}

/// Completion state of one audit event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventStatus {
    /// The audited operation finished successfully.
    Completed,
    /// Any other or missing status.
    #[default]
    #[serde(other)]
    Other,
}

/// Event context. Only promotion events populate these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditContext {
    /// Environment the bundle was promoted to.
    #[serde(default)]
    pub environment: Option<String>,
    /// Promotion creation time as sent by the server, not yet coerced.
    #[serde(default)]
    pub promotion_created_millis: Option<Value>,
    /// Repositories included in the promotion.
    #[serde(default, deserialize_with = "null_as_default")]
    pub included_repository_keys: Vec<String>,
    /// Repositories excluded from the promotion.
    #[serde(default, deserialize_with = "null_as_default")]
    pub excluded_repository_keys: Vec<String>,
}

/// One lifecycle audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Audited subject.
    pub subject_type: AuditSubjectType,
    /// Completion state.
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_status: AuditEventStatus,
    /// Subject-specific context.
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: AuditContext,
}

impl AuditEvent {
    /// Returns whether the event is a promotion, in any state.
    #[must_use]
    pub fn is_promotion(&self) -> bool {
        self.subject_type == AuditSubjectType::Promotion
    }

    /// Returns whether the event is a promotion that completed.
    #[must_use]
    pub fn is_completed_promotion(&self) -> bool {
        self.is_promotion() && self.event_status == AuditEventStatus::Completed
    }
}

/// Newest-first audit history of one release bundle version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    #[serde(default, deserialize_with = "null_as_default")]
    audits: Vec<AuditEvent>,
}

impl AuditTrail {
    /// Creates a trail from events already ordered newest-first.
    #[must_use]
    pub fn new(audits: Vec<AuditEvent>) -> Self {
        Self { audits }
    }

    /// Returns the events, newest first.
    #[must_use]
    pub fn events(&self) -> &[AuditEvent] {
        self.audits.as_slice()
    }

    /// Returns whether the trail holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.audits.is_empty()
    }
}
