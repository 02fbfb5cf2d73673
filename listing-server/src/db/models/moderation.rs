//! Moderation Record Model (append-only audit trail)

use super::RestaurantId;
use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::util::now_millis;
use surrealdb::RecordId;

/// Admin decision on a listing or a modification request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationDecision {
    Approved,
    Rejected,
}

/// Which flow the decision belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    /// Decision on a new listing submission
    Listing,
    /// Decision on a modification request
    Modification,
}

/// One immutable audit entry per admin decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRecord {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    pub admin_id: String,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant_id: RestaurantId,
    pub decision: ModerationDecision,
    pub remarks: String,
    pub record_kind: RecordKind,
    pub created_at: i64,
}

impl ModerationRecord {
    pub fn new(
        admin_id: impl Into<String>,
        restaurant_id: RestaurantId,
        decision: ModerationDecision,
        remarks: impl Into<String>,
        record_kind: RecordKind,
    ) -> Self {
        Self {
            id: None,
            admin_id: admin_id.into(),
            restaurant_id,
            decision,
            remarks: remarks.into(),
            record_kind,
            created_at: now_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_serializes_screaming() {
        let json = serde_json::to_string(&ModerationDecision::Rejected).unwrap();
        assert_eq!(json, "\"REJECTED\"");
        let json = serde_json::to_string(&RecordKind::Modification).unwrap();
        assert_eq!(json, "\"MODIFICATION\"");
    }
}
