//! Listing Server - restaurant listing platform backend
//!
//! # Architecture overview
//!
//! - **Cache** (`cache`): generic TTL key/value store backing the
//!   verification-code flow
//! - **Database** (`db`): embedded SurrealDB models and repositories
//! - **Services** (`services`): the restaurant lifecycle engine, OTP
//!   verification, object storage
//! - **Events** (`events`): fire-and-forget domain event publication
//! - **Auth** (`auth`): JWT validation, role gating
//! - **HTTP** (`routes`/`handler`): axum routing and request handlers
//!
//! # Module structure
//!
//! ```text
//! listing-server/src/
//! ├── core/          # config, state, server, background tasks
//! ├── auth/          # JWT auth, middleware
//! ├── cache/         # TTL cache service
//! ├── db/            # models + repositories (SurrealDB)
//! ├── events/        # event publisher
//! ├── services/      # lifecycle engine, verification, storage
//! ├── handler/       # HTTP handlers
//! ├── routes/        # routers and middleware stack
//! └── utils/         # logger, validation, error re-exports
//! ```

pub mod auth;
pub mod cache;
pub mod core;
pub mod db;
pub mod events;
pub mod handler;
pub mod routes;
pub mod services;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use cache::{CacheError, CacheService};
pub use core::{Config, Server, ServerState};
pub use events::EventPublisher;
pub use services::{RestaurantService, VerificationService};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Prepare the process environment: load `.env`, then bring up logging.
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is fine; environment variables win either way
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

/// Log the startup banner
pub fn print_banner() {
    tracing::info!("==============================================");
    tracing::info!("  LISTING SERVER v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("==============================================");
}
