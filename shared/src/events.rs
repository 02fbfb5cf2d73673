//! Restaurant domain events - immutable facts published after durable writes
//!
//! Every externally-visible mutation of a listing produces exactly one
//! event. Payload shapes are a closed set, one struct per subject, so
//! consumers can rely on a stable contract. Events carry the record
//! `version` where consumers need to discard stale or out-of-order
//! updates (at-least-once, idempotent-by-version processing).

use crate::types::{Address, GeoPoint};
use serde::{Deserialize, Serialize};

/// Event subject enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSubject {
    RestaurantApproved,
    RestaurantUpdated,
    RestaurantDetailsUpdated,
    RestaurantDeleted,
}

impl std::fmt::Display for EventSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventSubject::RestaurantApproved => write!(f, "RESTAURANT_APPROVED"),
            EventSubject::RestaurantUpdated => write!(f, "RESTAURANT_UPDATED"),
            EventSubject::RestaurantDetailsUpdated => write!(f, "RESTAURANT_DETAILS_UPDATED"),
            EventSubject::RestaurantDeleted => write!(f, "RESTAURANT_DELETED"),
        }
    }
}

/// Full public projection of a freshly approved listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantApproved {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub tax_id: String,
    pub cuisine: Vec<String>,
    pub images: Vec<String>,
    pub address: Address,
    pub location: GeoPoint,
}

/// Protected fields rewritten through an approved modification request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantUpdated {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub tax_id: String,
    pub version: i64,
}

/// Changed subset of the mutable details, plus the new version.
///
/// Unchanged fields are omitted from the wire payload entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RestaurantDetailsUpdated {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    pub version: i64,
}

/// Soft-deletion notice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantDeleted {
    pub id: String,
    pub version: i64,
}

/// Domain event envelope - tagged union over the payload structs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "subject", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestaurantEvent {
    RestaurantApproved(RestaurantApproved),
    RestaurantUpdated(RestaurantUpdated),
    RestaurantDetailsUpdated(RestaurantDetailsUpdated),
    RestaurantDeleted(RestaurantDeleted),
}

impl RestaurantEvent {
    /// Subject this event is published under
    pub fn subject(&self) -> EventSubject {
        match self {
            RestaurantEvent::RestaurantApproved(_) => EventSubject::RestaurantApproved,
            RestaurantEvent::RestaurantUpdated(_) => EventSubject::RestaurantUpdated,
            RestaurantEvent::RestaurantDetailsUpdated(_) => EventSubject::RestaurantDetailsUpdated,
            RestaurantEvent::RestaurantDeleted(_) => EventSubject::RestaurantDeleted,
        }
    }

    /// Identity of the listing this event concerns
    pub fn restaurant_id(&self) -> &str {
        match self {
            RestaurantEvent::RestaurantApproved(e) => &e.id,
            RestaurantEvent::RestaurantUpdated(e) => &e.id,
            RestaurantEvent::RestaurantDetailsUpdated(e) => &e.id,
            RestaurantEvent::RestaurantDeleted(e) => &e.id,
        }
    }
}
