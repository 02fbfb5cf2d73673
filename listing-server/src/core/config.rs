//! Server configuration
//!
//! All settings load from environment variables with sensible defaults:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/listing-server | Work directory (database, uploads, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | ENVIRONMENT | development | development / staging / production |
//! | OTP_TTL_SECS | 120 | Verification code window |
//! | CACHE_SWEEP_SECS | 60 | Cache sweeper period |
//! | DEFAULT_PAGE_SIZE | 20 | Listing page size when unspecified |

use crate::auth::JwtConfig;
use crate::services::verification::DEFAULT_CODE_TTL_SECS;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory holding the database, uploads, and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// JWT validation configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Verification code TTL in seconds
    pub otp_ttl_secs: u64,
    /// Cache sweeper period in seconds
    pub cache_sweep_secs: u64,
    /// Page size used when a listing query gives no limit
    pub default_page_size: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/listing-server".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            otp_ttl_secs: std::env::var("OTP_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_CODE_TTL_SECS),
            cache_sweep_secs: std::env::var("CACHE_SWEEP_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            default_page_size: std::env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(20),
        }
    }

    /// Override the work directory and port (test scenarios)
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads")
    }

    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the work directory layout if missing
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
