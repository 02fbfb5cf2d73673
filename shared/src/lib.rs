//! Shared types for the listing platform
//!
//! Common types used across multiple crates including the unified error
//! system, domain event definitions, and utility types.

pub mod error;
pub mod events;
pub mod types;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

// Event re-exports (for convenient access)
pub use events::{EventSubject, RestaurantEvent};
