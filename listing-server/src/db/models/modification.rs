//! Modification Request Model

use super::serde_helpers;
use super::{RestaurantDetails, RestaurantId};
use serde::{Deserialize, Serialize};
use shared::types::{Address, GeoPoint};
use shared::util::now_millis;
use surrealdb::RecordId;

/// Shadow record holding unapproved edits to the protected fields of an
/// already-approved listing. At most one exists per restaurant; an admin
/// decision destroys it (approval copies `name`/`tax_id` into the
/// primary record first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationRequest {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Owning reference; the primary record stays authoritative
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant_id: RestaurantId,
    /// Requester identity
    pub user_id: String,
    pub name: String,
    pub tax_id: String,
    pub cuisine: Vec<String>,
    pub address: Address,
    pub location: GeoPoint,
    pub phone_number: String,
    pub created_at: i64,
}

impl ModificationRequest {
    /// Capture the requested edit for the given restaurant
    pub fn new(
        restaurant_id: RestaurantId,
        user_id: impl Into<String>,
        details: RestaurantDetails,
    ) -> Self {
        Self {
            id: None,
            restaurant_id,
            user_id: user_id.into(),
            name: details.name,
            tax_id: details.tax_id,
            cuisine: details.cuisine,
            address: details.address,
            location: details.location,
            phone_number: details.phone_number,
            created_at: now_millis(),
        }
    }
}
