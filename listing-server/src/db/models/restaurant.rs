//! Restaurant Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::types::{Address, GeoPoint, ListingStatus};
use shared::util::{now_millis, slugify};
use surrealdb::RecordId;

/// Restaurant ID type
pub type RestaurantId = RecordId;

/// Maximum number of gallery images per listing
pub const MAX_IMAGES: usize = 10;

/// Restaurant model matching the SurrealDB schema
///
/// The primary, publicly-visible record. Protected fields (`name`,
/// `tax_id`) of an APPROVED listing only change through an approved
/// modification request; everything else is edited in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RestaurantId>,
    /// Owner identity (platform user id from the JWT subject)
    pub user_id: String,
    pub name: String,
    /// Derived from `name`; recomputed whenever the name is rewritten
    pub slug: String,
    pub tax_id: String,
    #[serde(default)]
    pub cuisine: Vec<String>,
    pub address: Address,
    pub location: GeoPoint,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub status: ListingStatus,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_verified: bool,
    /// Soft-delete flag; meaningful only once APPROVED (PENDING records
    /// are hard-deleted instead)
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_deleted: bool,
    /// Bumped on every externally-visible mutation; embedded in events
    #[serde(default)]
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Editable field set submitted on create and owner update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantDetails {
    pub name: String,
    pub tax_id: String,
    pub cuisine: Vec<String>,
    pub address: Address,
    pub location: GeoPoint,
    pub phone_number: String,
}

impl Restaurant {
    /// Build a fresh PENDING record for the given owner
    pub fn new(user_id: impl Into<String>, details: RestaurantDetails) -> Self {
        let now = now_millis();
        Self {
            id: None,
            user_id: user_id.into(),
            slug: slugify(&details.name),
            name: details.name,
            tax_id: details.tax_id,
            cuisine: details.cuisine,
            address: details.address,
            location: details.location,
            phone_number: details.phone_number,
            cover: None,
            images: Vec::new(),
            status: ListingStatus::Pending,
            is_verified: false,
            is_deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// The record id in "table:key" string form
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }

    /// Mark an externally-visible mutation: bump the version and refresh
    /// the updated timestamp.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = now_millis();
    }

    /// Rewrite the protected fields and recompute the slug
    pub fn set_primary_details(&mut self, name: String, tax_id: String) {
        self.slug = slugify(&name);
        self.name = name;
        self.tax_id = tax_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_details() -> RestaurantDetails {
        RestaurantDetails {
            name: "The Golden Spoon".to_string(),
            tax_id: "B12345678".to_string(),
            cuisine: vec!["spanish".to_string()],
            address: Address {
                country: "ES".to_string(),
                city: "Valencia".to_string(),
                street: "Carrer de la Pau 12".to_string(),
            },
            location: GeoPoint {
                longitude: -0.375,
                latitude: 39.47,
            },
            phone_number: "+34600111222".to_string(),
        }
    }

    #[test]
    fn test_new_restaurant_is_pending_and_unverified() {
        let restaurant = Restaurant::new("user-1", sample_details());
        assert_eq!(restaurant.status, ListingStatus::Pending);
        assert!(!restaurant.is_verified);
        assert!(!restaurant.is_deleted);
        assert!(restaurant.images.is_empty());
        assert_eq!(restaurant.version, 0);
        assert_eq!(restaurant.slug, "the-golden-spoon");
    }

    #[test]
    fn test_touch_bumps_version() {
        let mut restaurant = Restaurant::new("user-1", sample_details());
        restaurant.touch();
        restaurant.touch();
        assert_eq!(restaurant.version, 2);
    }

    #[test]
    fn test_set_primary_details_recomputes_slug() {
        let mut restaurant = Restaurant::new("user-1", sample_details());
        restaurant.set_primary_details("Casa Nova".to_string(), "B87654321".to_string());
        assert_eq!(restaurant.name, "Casa Nova");
        assert_eq!(restaurant.slug, "casa-nova");
        assert_eq!(restaurant.tax_id, "B87654321");
    }
}
