//! Database Models
//!
//! Typed documents matching the SurrealDB tables.

pub mod moderation;
pub mod modification;
pub mod restaurant;
pub mod serde_helpers;

pub use moderation::{ModerationDecision, ModerationRecord, RecordKind};
pub use modification::ModificationRequest;
pub use restaurant::{MAX_IMAGES, Restaurant, RestaurantDetails, RestaurantId};
