use std::fmt::{Display, Formatter};

use serde_json::Value;

/// Promotion property key that marks a promotion as replicated by automation.
pub const REPLICATION_STATUS_PROPERTY: &str = "replication.status";

/// Marker value stored under [`REPLICATION_STATUS_PROPERTY`].
pub const REPLICATION_STATUS_AUTOMATED: &str = "automated";

/// Promotion creation time coerced from its wire representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionTimestamp {
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// Value the server sent that is not an integer, kept verbatim.
    Raw(String),
}

impl PromotionTimestamp {
    /// Coerces a raw `promotion_created_millis` value.
    ///
    /// Integers, whole floats and strings holding an integer become
    /// [`Self::Millis`]; anything else is preserved as [`Self::Raw`].
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().and_then(whole_millis))
                .map_or_else(|| Self::Raw(number.to_string()), Self::Millis),
            Value::String(text) => text
                .trim()
                .parse::<i64>()
                .map_or_else(|_| Self::Raw(text.clone()), Self::Millis),
            other => Self::Raw(other.to_string()),
        }
    }

    /// Returns the timestamp a replayed promotion should be recorded with.
    ///
    /// The replay must sort strictly after the original in a
    /// millisecond-granularity trail. Raw values pass through unchanged.
    #[must_use]
    pub fn adjusted_for_copy(&self) -> Self {
        match self {
            Self::Millis(millis) => Self::Millis(millis.saturating_add(1)),
            Self::Raw(raw) => Self::Raw(raw.clone()),
        }
    }

    /// Returns the millisecond value when the timestamp is numeric.
    #[must_use]
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            Self::Millis(millis) => Some(*millis),
            Self::Raw(_) => None,
        }
    }
}

// i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
fn whole_millis(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

impl Display for PromotionTimestamp {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Millis(millis) => write!(formatter, "{millis}"),
            Self::Raw(raw) => formatter.write_str(raw),
        }
    }
}

/// Promotion to replay on the target server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionIntent {
    /// Environment to promote into.
    pub environment: String,
    /// Project owning the bundle.
    pub project_key: String,
    /// Repositories the source promotion included.
    pub included_repository_keys: Vec<String>,
    /// Repositories the source promotion excluded.
    pub excluded_repository_keys: Vec<String>,
    /// Creation time of the source promotion.
    pub source_timestamp: PromotionTimestamp,
    /// Creation time to record for the replayed promotion.
    pub replay_timestamp: PromotionTimestamp,
}
