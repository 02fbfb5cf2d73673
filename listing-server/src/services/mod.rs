//! Service layer
//!
//! - [`RestaurantService`] - the restaurant lifecycle engine
//! - [`VerificationService`] - OTP code lifecycle on the TTL cache
//! - [`ObjectStorage`] - image storage boundary

pub mod restaurant;
pub mod storage;
pub mod verification;

pub use restaurant::{ApprovedPage, RestaurantService};
pub use storage::{ImageUpload, LocalObjectStorage, ObjectStorage, StorageError};
pub use verification::{
    CodeGenerator, DEFAULT_CODE_TTL_SECS, RandomCodeGenerator, VerificationService,
};
