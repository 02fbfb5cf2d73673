//! Verification Code Issuer
//!
//! Owns the lifecycle of one-time phone verification codes in the TTL
//! cache: issue with a fixed window, check a submission, discard after a
//! successful verify. Code *delivery* is out of scope; generation sits
//! behind [`CodeGenerator`] so transports can plug in their own source.

use crate::cache::CacheService;
use crate::utils::{AppError, AppResult};
use rand::Rng;
use std::sync::Arc;

/// Default issuance window in seconds
pub const DEFAULT_CODE_TTL_SECS: u64 = 120;

/// Produces one-time verification codes
pub trait CodeGenerator: Send + Sync {
    fn generate_code(&self) -> String;
}

/// Uniform random numeric codes (the shape SMS transports expect)
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    digits: u32,
}

impl RandomCodeGenerator {
    pub fn new(digits: u32) -> Self {
        Self { digits }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate_code(&self) -> String {
        let max = 10u64.pow(self.digits);
        let code = rand::thread_rng().gen_range(0..max);
        format!("{:0width$}", code, width = self.digits as usize)
    }
}

/// Cache-backed verification code service
#[derive(Clone)]
pub struct VerificationService {
    cache: CacheService,
    generator: Arc<dyn CodeGenerator>,
    ttl_secs: u64,
}

impl VerificationService {
    pub fn new(cache: CacheService, generator: Arc<dyn CodeGenerator>, ttl_secs: u64) -> Self {
        Self {
            cache,
            generator,
            ttl_secs,
        }
    }

    /// Issue a code for the key, or return the remaining window of the
    /// code already in flight. The code itself never leaves the service;
    /// callers only learn the TTL.
    pub async fn issue(&self, key: &str) -> AppResult<u64> {
        let generator = self.generator.clone();
        let (_, ttl) = self
            .cache
            .compute_if_absent(key, self.ttl_secs, || async move {
                generator.generate_code()
            })
            .await
            .map_err(|e| AppError::cache(e.to_string()))?;
        Ok(ttl)
    }

    /// Check a submission against the live code. A cache miss (expired or
    /// never issued) reads the same as a mismatch.
    pub async fn check(&self, key: &str, submitted: &str) -> AppResult<bool> {
        let cached: Option<String> = self
            .cache
            .get(key)
            .await
            .map_err(|e| AppError::cache(e.to_string()))?;
        Ok(cached.as_deref() == Some(submitted))
    }

    /// Drop the code after a successful verification
    pub async fn discard(&self, key: &str) {
        self.cache.delete(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Deterministic generator for tests
    struct FixedCode(&'static str);

    impl CodeGenerator for FixedCode {
        fn generate_code(&self) -> String {
            self.0.to_string()
        }
    }

    fn service(code: &'static str) -> VerificationService {
        VerificationService::new(CacheService::new(), Arc::new(FixedCode(code)), 120)
    }

    #[test]
    fn test_random_generator_width() {
        let generator = RandomCodeGenerator::default();
        for _ in 0..20 {
            let code = generator.generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_issue_returns_ttl_not_code() {
        let service = service("424242");
        let ttl = service.issue("restaurant:a").await.unwrap();
        assert_eq!(ttl, 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reissue_keeps_original_window() {
        let service = service("424242");
        service.issue("restaurant:a").await.unwrap();

        tokio::time::advance(Duration::from_secs(40)).await;

        let ttl = service.issue("restaurant:a").await.unwrap();
        assert_eq!(ttl, 80);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_mismatch_miss_and_match() {
        let service = service("424242");
        service.issue("restaurant:a").await.unwrap();

        assert!(!service.check("restaurant:a", "000000").await.unwrap());
        assert!(service.check("restaurant:a", "424242").await.unwrap());

        // Expired code reads the same as a wrong one
        tokio::time::advance(Duration::from_secs(121)).await;
        assert!(!service.check("restaurant:a", "424242").await.unwrap());
    }

    #[tokio::test]
    async fn test_discard_removes_code() {
        let service = service("424242");
        service.issue("restaurant:a").await.unwrap();

        service.discard("restaurant:a").await;
        assert!(!service.check("restaurant:a", "424242").await.unwrap());
    }
}
