//! Restaurant Lifecycle Engine
//!
//! Orchestrates the moderation lifecycle of a listing: submission,
//! approval or rejection, post-approval edits through the
//! modification-request shadow store, image management, phone
//! verification, and soft-deletion. Every externally-visible mutation
//! persists first, bumps the record version, and then fires exactly one
//! domain event (fire-and-forget).

use futures::future::join_all;
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::db::models::{
    MAX_IMAGES, ModerationDecision, ModerationRecord, ModificationRequest, RecordKind, Restaurant,
    RestaurantDetails, RestaurantId,
};
use crate::db::repository::{
    ModerationRecordRepository, ModificationRequestRepository, RestaurantRepository,
};
use crate::events::EventPublisher;
use crate::services::storage::{ImageUpload, ObjectStorage};
use crate::services::verification::VerificationService;
use crate::utils::{AppError, AppResult, ErrorCode};
use serde::Serialize;
use shared::events::{
    RestaurantApproved, RestaurantDeleted, RestaurantDetailsUpdated, RestaurantEvent,
    RestaurantUpdated,
};
use shared::types::ListingStatus;

/// One page of approved listings; the total count is computed only for
/// the first page.
#[derive(Debug, Serialize)]
pub struct ApprovedPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    pub restaurants: Vec<Restaurant>,
}

/// The lifecycle engine. Request-scoped and stateless between commands;
/// cheap to clone.
#[derive(Clone)]
pub struct RestaurantService {
    restaurants: RestaurantRepository,
    modifications: ModificationRequestRepository,
    moderation: ModerationRecordRepository,
    verification: VerificationService,
    storage: Arc<dyn ObjectStorage>,
    publisher: EventPublisher,
}

impl RestaurantService {
    pub fn new(
        db: Surreal<Db>,
        verification: VerificationService,
        storage: Arc<dyn ObjectStorage>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            restaurants: RestaurantRepository::new(db.clone()),
            modifications: ModificationRequestRepository::new(db.clone()),
            moderation: ModerationRecordRepository::new(db),
            verification,
            storage,
            publisher,
        }
    }

    // ==================== Queries ====================

    /// Load a restaurant by id (non-deleted filter). When `user` is
    /// given, the record must belong to them.
    pub async fn find_by_id(
        &self,
        id: &str,
        user: Option<&CurrentUser>,
    ) -> AppResult<Restaurant> {
        let found = self
            .restaurants
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;

        if let Some(user) = user
            && found.user_id != user.id
        {
            return Err(AppError::not_owner());
        }

        Ok(found)
    }

    /// Load a restaurant by slug (non-deleted)
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Restaurant> {
        self.restaurants
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))
    }

    /// Every record, including pending and soft-deleted (admin view)
    pub async fn get_all(&self) -> AppResult<Vec<Restaurant>> {
        Ok(self.restaurants.find_all().await?)
    }

    /// Moderation queue (admin view)
    pub async fn get_pending(&self) -> AppResult<Vec<Restaurant>> {
        Ok(self.restaurants.find_pending().await?)
    }

    /// The caller's own listings
    pub async fn get_by_user(&self, user: &CurrentUser) -> AppResult<Vec<Restaurant>> {
        Ok(self.restaurants.find_by_user(&user.id).await?)
    }

    /// Approved listings with offset pagination
    pub async fn get_approved(&self, offset: u64, limit: u64) -> AppResult<ApprovedPage> {
        let count = if offset == 0 {
            Some(self.restaurants.count_approved().await?)
        } else {
            None
        };
        let restaurants = self.restaurants.find_approved(offset, limit).await?;
        Ok(ApprovedPage { count, restaurants })
    }

    /// Slugs of every approved listing
    pub async fn approved_slugs(&self) -> AppResult<Vec<String>> {
        Ok(self.restaurants.approved_slugs().await?)
    }

    /// Moderation history (admin view)
    pub async fn moderation_records(&self, limit: u64) -> AppResult<Vec<ModerationRecord>> {
        Ok(self.moderation.recent(limit).await?)
    }

    // ==================== Commands ====================

    /// Create a new PENDING listing; returns the generated slug
    pub async fn create(&self, user: &CurrentUser, details: RestaurantDetails) -> AppResult<String> {
        self.ensure_unique(&details.name, &details.tax_id, None)
            .await?;

        let created = self
            .restaurants
            .create(Restaurant::new(&user.id, details))
            .await?;

        info!(id = %created.id_string(), user_id = %user.id, "Restaurant submitted");
        Ok(created.slug)
    }

    /// Admin decision on a new listing: approve flips the status and
    /// announces the listing; reject removes the record entirely. One
    /// moderation record is appended either way.
    pub async fn decide_listing(
        &self,
        admin: &CurrentUser,
        id: &str,
        decision: ModerationDecision,
        remarks: String,
    ) -> AppResult<()> {
        let mut found = self.find_by_id(id, None).await?;

        if found.status == ListingStatus::Approved {
            return Err(AppError::new(ErrorCode::AlreadyApproved));
        }

        let restaurant_id = Self::require_id(&found)?;

        match decision {
            ModerationDecision::Approved => {
                found.status = ListingStatus::Approved;
                found.touch();
                let saved = self.restaurants.save(&found).await?;

                self.publisher
                    .emit(RestaurantEvent::RestaurantApproved(RestaurantApproved {
                        id: saved.id_string(),
                        name: saved.name.clone(),
                        slug: saved.slug.clone(),
                        tax_id: saved.tax_id.clone(),
                        cuisine: saved.cuisine.clone(),
                        images: saved.images.clone(),
                        address: saved.address.clone(),
                        location: saved.location.clone(),
                    }));

                info!(id = %saved.id_string(), admin_id = %admin.id, "Restaurant approved");
            }
            ModerationDecision::Rejected => {
                self.restaurants.delete(id).await?;
                info!(id = %id, admin_id = %admin.id, "Restaurant rejected and removed");
            }
        }

        // The audit entry is written regardless of which branch ran
        self.moderation
            .create(ModerationRecord::new(
                &admin.id,
                restaurant_id,
                decision,
                remarks,
                RecordKind::Listing,
            ))
            .await?;

        Ok(())
    }

    /// Owner edit of the full editable field set.
    ///
    /// Protected fields (name/tax id) apply directly while the listing is
    /// still PENDING; once APPROVED they are parked in a modification
    /// request for admin review. Everything else updates in place. A
    /// phone change always clears the verification flag.
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: &str,
        details: RestaurantDetails,
    ) -> AppResult<()> {
        let mut found = self.find_by_id(id, Some(user)).await?;
        let restaurant_id = Self::require_id(&found)?;

        if found.name != details.name || found.tax_id != details.tax_id {
            self.ensure_unique(&details.name, &details.tax_id, Some(&restaurant_id))
                .await?;

            if found.status == ListingStatus::Pending {
                found.set_primary_details(details.name.clone(), details.tax_id.clone());
            } else {
                self.modifications
                    .replace_for_restaurant(ModificationRequest::new(
                        restaurant_id.clone(),
                        &user.id,
                        details.clone(),
                    ))
                    .await?;
                info!(id = %found.id_string(), "Protected edit parked as modification request");
            }
        }

        // Changed-subset projection, computed before the overwrite
        let mut changed = RestaurantDetailsUpdated {
            id: found.id_string(),
            ..Default::default()
        };
        if found.cuisine != details.cuisine {
            changed.cuisine = Some(details.cuisine.clone());
        }
        if found.address != details.address {
            changed.address = Some(details.address.clone());
        }
        if found.location != details.location {
            changed.location = Some(details.location.clone());
        }
        if found.phone_number != details.phone_number {
            changed.phone_number = Some(details.phone_number.clone());
            found.is_verified = false;
        }

        found.cuisine = details.cuisine;
        found.address = details.address;
        found.location = details.location;
        found.phone_number = details.phone_number;
        found.touch();

        let saved = self.restaurants.save(&found).await?;

        changed.version = saved.version;
        self.publisher
            .emit(RestaurantEvent::RestaurantDetailsUpdated(changed));

        Ok(())
    }

    /// Admin decision on a pending modification request. Approval copies
    /// the protected fields into the primary record; the request itself
    /// is destroyed either way, after the audit entry is appended.
    pub async fn decide_modification(
        &self,
        admin: &CurrentUser,
        id: &str,
        decision: ModerationDecision,
        remarks: String,
    ) -> AppResult<()> {
        let found = self.find_by_id(id, None).await?;
        let restaurant_id = Self::require_id(&found)?;

        let request = self
            .modifications
            .find_by_restaurant(&restaurant_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ModificationRequestNotFound))?;

        if decision == ModerationDecision::Approved {
            let mut found = found;
            found.set_primary_details(request.name.clone(), request.tax_id.clone());
            found.touch();
            let saved = self.restaurants.save(&found).await?;

            self.publisher
                .emit(RestaurantEvent::RestaurantUpdated(RestaurantUpdated {
                    id: saved.id_string(),
                    name: saved.name.clone(),
                    slug: saved.slug.clone(),
                    tax_id: saved.tax_id.clone(),
                    version: saved.version,
                }));

            info!(id = %saved.id_string(), admin_id = %admin.id, "Modification request approved");
        } else {
            info!(id = %id, admin_id = %admin.id, "Modification request rejected");
        }

        self.moderation
            .create(ModerationRecord::new(
                &admin.id,
                restaurant_id.clone(),
                decision,
                remarks,
                RecordKind::Modification,
            ))
            .await?;

        self.modifications
            .delete_for_restaurant(&restaurant_id)
            .await?;

        Ok(())
    }

    /// Owner- or admin-initiated removal. APPROVED listings are
    /// soft-deleted (they were publicly visible; consumers get a deletion
    /// event); PENDING listings are hard-deleted silently.
    pub async fn delete(&self, user: &CurrentUser, id: &str) -> AppResult<()> {
        let mut found = self.find_by_id(id, None).await?;

        if found.user_id != user.id && !user.role.is_admin() {
            return Err(AppError::not_owner());
        }

        if found.status == ListingStatus::Approved {
            found.is_deleted = true;
            found.touch();
            let saved = self.restaurants.save(&found).await?;

            self.publisher
                .emit(RestaurantEvent::RestaurantDeleted(RestaurantDeleted {
                    id: saved.id_string(),
                    version: saved.version,
                }));

            info!(id = %saved.id_string(), "Restaurant soft-deleted");
        } else {
            self.restaurants.delete(id).await?;
            info!(id = %id, "Pending restaurant removed");
        }

        Ok(())
    }

    // ==================== Images ====================

    /// Add a batch of gallery images (APPROVED listings only).
    ///
    /// Uploads run concurrently; individual failures are dropped from
    /// the result set instead of failing the command. Returns the full
    /// image list after the append.
    pub async fn add_images(
        &self,
        user: &CurrentUser,
        id: &str,
        uploads: Vec<ImageUpload>,
    ) -> AppResult<Vec<String>> {
        let mut found = self.find_by_id(id, Some(user)).await?;
        let restaurant_id = Self::require_id(&found)?;

        if found.status != ListingStatus::Approved {
            return Err(AppError::with_message(
                ErrorCode::InvalidRequest,
                "Restaurant status should be approved",
            ));
        }

        if found.images.len() + uploads.len() > MAX_IMAGES {
            return Err(AppError::new(ErrorCode::TooManyImages));
        }

        let path = Self::images_path(&restaurant_id);
        let results = join_all(uploads.into_iter().map(|upload| {
            let storage = self.storage.clone();
            let path = path.clone();
            async move { storage.upload(&path, upload).await }
        }))
        .await;

        for result in results {
            match result {
                Ok(reference) => found.images.push(reference),
                Err(e) => warn!(error = %e, id = %id, "Image upload dropped"),
            }
        }

        found.touch();
        let saved = self.restaurants.save(&found).await?;

        self.publisher.emit(RestaurantEvent::RestaurantDetailsUpdated(
            RestaurantDetailsUpdated {
                id: saved.id_string(),
                images: Some(saved.images.clone()),
                version: saved.version,
                ..Default::default()
            },
        ));

        Ok(saved.images)
    }

    /// Remove named images from the gallery and the object store
    pub async fn remove_images(
        &self,
        user: &CurrentUser,
        id: &str,
        images: Vec<String>,
    ) -> AppResult<()> {
        let mut found = self.find_by_id(id, Some(user)).await?;
        let restaurant_id = Self::require_id(&found)?;

        let path = Self::images_path(&restaurant_id);
        self.storage.delete_many(&path, &images).await?;

        found.images.retain(|reference| !images.contains(reference));
        found.touch();
        let saved = self.restaurants.save(&found).await?;

        self.publisher.emit(RestaurantEvent::RestaurantDetailsUpdated(
            RestaurantDetailsUpdated {
                id: saved.id_string(),
                images: Some(saved.images.clone()),
                version: saved.version,
                ..Default::default()
            },
        ));

        Ok(())
    }

    /// Replace the cover image; the previous object is removed only once
    /// the new reference is durably persisted.
    pub async fn replace_cover(
        &self,
        user: &CurrentUser,
        id: &str,
        upload: ImageUpload,
    ) -> AppResult<String> {
        let mut found = self.find_by_id(id, Some(user)).await?;
        let restaurant_id = Self::require_id(&found)?;

        let path = Self::cover_path(&restaurant_id);
        let previous = found.cover.clone();
        let reference = self.storage.upload(&path, upload).await?;

        found.cover = Some(reference.clone());
        found.touch();
        self.restaurants.save(&found).await?;

        if let Some(previous) = previous {
            self.storage.delete_one(&path, &previous).await?;
        }

        Ok(reference)
    }

    // ==================== Verification ====================

    /// Issue a phone verification code; only the remaining TTL reaches
    /// the caller (the code travels out-of-band).
    pub async fn generate_otp(&self, user: &CurrentUser, id: &str) -> AppResult<u64> {
        let found = self.find_by_id(id, Some(user)).await?;

        if found.is_verified {
            return Err(AppError::new(ErrorCode::AlreadyVerified));
        }

        self.verification.issue(&found.id_string()).await
    }

    /// Verify a submitted code. On success the record is flagged
    /// verified and the cache entry is destroyed.
    pub async fn verify_otp(&self, user: &CurrentUser, id: &str, code: &str) -> AppResult<()> {
        let mut found = self.find_by_id(id, Some(user)).await?;

        if found.is_verified {
            return Err(AppError::new(ErrorCode::AlreadyVerified));
        }

        let key = found.id_string();
        if !self.verification.check(&key, code).await? {
            return Err(AppError::new(ErrorCode::VerificationCodeInvalid));
        }

        found.is_verified = true;
        found.touch();
        self.restaurants.save(&found).await?;
        self.verification.discard(&key).await;

        info!(id = %key, "Restaurant phone verified");
        Ok(())
    }

    // ==================== Helpers ====================

    /// Duplicate check against both the primary store and the pending
    /// modification requests.
    async fn ensure_unique(
        &self,
        name: &str,
        tax_id: &str,
        exclude: Option<&RestaurantId>,
    ) -> AppResult<()> {
        if self
            .restaurants
            .find_duplicate(name, tax_id, exclude)
            .await?
            .is_some()
        {
            return Err(AppError::new(ErrorCode::DuplicateListing));
        }

        if self
            .modifications
            .find_duplicate(name, tax_id, exclude)
            .await?
            .is_some()
        {
            return Err(AppError::new(ErrorCode::DuplicateListing));
        }

        Ok(())
    }

    fn require_id(restaurant: &Restaurant) -> AppResult<RestaurantId> {
        restaurant
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Restaurant record has no id"))
    }

    fn images_path(id: &RestaurantId) -> String {
        format!("{}/images", id.key())
    }

    fn cover_path(id: &RestaurantId) -> String {
        format!("{}/cover", id.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheService;
    use crate::services::storage::test_support::png_upload;
    use crate::services::storage::{LocalObjectStorage, StorageError};
    use crate::services::verification::CodeGenerator;
    use async_trait::async_trait;
    use shared::types::{Address, GeoPoint, UserRole};
    use std::path::PathBuf;
    use surrealdb::engine::local::Mem;
    use tokio::sync::broadcast::error::TryRecvError;

    struct FixedCode;

    impl CodeGenerator for FixedCode {
        fn generate_code(&self) -> String {
            "424242".to_string()
        }
    }

    /// Upload double that fails for filenames starting with "bad"
    struct FlakyStorage {
        inner: LocalObjectStorage,
    }

    #[async_trait]
    impl ObjectStorage for FlakyStorage {
        async fn upload(&self, path: &str, upload: ImageUpload) -> Result<String, StorageError> {
            if upload.filename.starts_with("bad") {
                return Err(StorageError::InvalidImage("simulated outage".to_string()));
            }
            self.inner.upload(path, upload).await
        }

        async fn delete_one(&self, path: &str, reference: &str) -> Result<(), StorageError> {
            self.inner.delete_one(path, reference).await
        }

        async fn delete_many(&self, path: &str, references: &[String]) -> Result<(), StorageError> {
            self.inner.delete_many(path, references).await
        }
    }

    struct Harness {
        service: RestaurantService,
        publisher: EventPublisher,
        cache: CacheService,
        restaurants: RestaurantRepository,
        modifications: ModificationRequestRepository,
        moderation: ModerationRecordRepository,
        storage_root: PathBuf,
        _tmp: tempfile::TempDir,
    }

    async fn harness() -> Harness {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let storage_root = tmp.path().to_path_buf();
        let storage = Arc::new(FlakyStorage {
            inner: LocalObjectStorage::new(&storage_root),
        });

        let cache = CacheService::new();
        let verification = VerificationService::new(cache.clone(), Arc::new(FixedCode), 120);
        let publisher = EventPublisher::new();
        let service = RestaurantService::new(db.clone(), verification, storage, publisher.clone());

        Harness {
            service,
            publisher,
            cache,
            restaurants: RestaurantRepository::new(db.clone()),
            modifications: ModificationRequestRepository::new(db.clone()),
            moderation: ModerationRecordRepository::new(db),
            storage_root,
            _tmp: tmp,
        }
    }

    fn owner() -> CurrentUser {
        CurrentUser {
            id: "user-1".to_string(),
            username: "alice".to_string(),
            role: UserRole::User,
        }
    }

    fn stranger() -> CurrentUser {
        CurrentUser {
            id: "user-2".to_string(),
            username: "mallory".to_string(),
            role: UserRole::User,
        }
    }

    fn admin() -> CurrentUser {
        CurrentUser {
            id: "admin-1".to_string(),
            username: "root".to_string(),
            role: UserRole::Admin,
        }
    }

    fn details(name: &str, tax_id: &str) -> RestaurantDetails {
        RestaurantDetails {
            name: name.to_string(),
            tax_id: tax_id.to_string(),
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

    async fn submit(h: &Harness, name: &str, tax_id: &str) -> String {
        let slug = h.service.create(&owner(), details(name, tax_id)).await.unwrap();
        h.service.find_by_slug(&slug).await.unwrap().id_string()
    }

    async fn approve(h: &Harness, id: &str) {
        h.service
            .decide_listing(&admin(), id, ModerationDecision::Approved, String::new())
            .await
            .unwrap();
    }

    // ==================== Create ====================

    #[tokio::test]
    async fn test_create_rejects_duplicate_name_or_tax_id() {
        let h = harness().await;
        submit(&h, "Casa Nova", "T1").await;

        let err = h
            .service
            .create(&owner(), details("Casa Nova", "OTHER"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateListing);

        let err = h
            .service
            .create(&owner(), details("Other Name", "T1"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateListing);
    }

    #[tokio::test]
    async fn test_create_rejects_collision_with_pending_request() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;

        // Owner parks a rename to "Trattoria" for review
        h.service
            .update(&owner(), &id, details("Trattoria", "T1"))
            .await
            .unwrap();

        let err = h
            .service
            .create(&stranger(), details("Trattoria", "T9"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateListing);
    }

    // ==================== Listing decision ====================

    #[tokio::test]
    async fn test_approve_emits_projection_and_appends_record() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        let mut rx = h.publisher.subscribe();
        h.service
            .decide_listing(&admin(), &id, ModerationDecision::Approved, "ok".to_string())
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            RestaurantEvent::RestaurantApproved(event) => {
                assert_eq!(event.id, id);
                assert_eq!(event.name, "Casa Nova");
                assert_eq!(event.slug, "casa-nova");
                assert_eq!(event.tax_id, "T1");
            }
            other => panic!("Expected approved event, got {:?}", other),
        }

        let found = h.service.find_by_id(&id, None).await.unwrap();
        assert_eq!(found.status, ListingStatus::Approved);

        let rid = found.id.unwrap();
        let records = h.moderation.by_restaurant(&rid).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_kind, RecordKind::Listing);
        assert_eq!(records[0].decision, ModerationDecision::Approved);
        assert_eq!(records[0].remarks, "ok");
    }

    #[tokio::test]
    async fn test_approve_is_one_way() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;

        let err = h
            .service
            .decide_listing(&admin(), &id, ModerationDecision::Approved, String::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyApproved);

        let err = h
            .service
            .decide_listing(&admin(), &id, ModerationDecision::Rejected, String::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyApproved);
    }

    #[tokio::test]
    async fn test_reject_hard_deletes_without_event() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        let mut rx = h.publisher.subscribe();
        h.service
            .decide_listing(&admin(), &id, ModerationDecision::Rejected, "spam".to_string())
            .await
            .unwrap();

        assert!(h.restaurants.find_by_id_raw(&id).await.unwrap().is_none());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        // The audit entry is still written
        let records = h.moderation.recent(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].decision, ModerationDecision::Rejected);
    }

    // ==================== Update ====================

    #[tokio::test]
    async fn test_update_pending_applies_protected_fields_directly() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        h.service
            .update(&owner(), &id, details("Trattoria", "T2"))
            .await
            .unwrap();

        let found = h.service.find_by_id(&id, None).await.unwrap();
        assert_eq!(found.name, "Trattoria");
        assert_eq!(found.slug, "trattoria");
        assert_eq!(found.tax_id, "T2");
        assert!(
            h.modifications
                .find_by_restaurant(&found.id.unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_approved_shadows_protected_fields() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;

        let mut rx = h.publisher.subscribe();
        h.service
            .update(&owner(), &id, details("Trattoria", "T2"))
            .await
            .unwrap();

        // Primary record unchanged on the protected fields
        let found = h.service.find_by_id(&id, None).await.unwrap();
        assert_eq!(found.name, "Casa Nova");
        assert_eq!(found.tax_id, "T1");

        // Shadow record holds the edit
        let request = h
            .modifications
            .find_by_restaurant(found.id.as_ref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request.name, "Trattoria");
        assert_eq!(request.tax_id, "T2");

        // Details event carries no unchanged fields
        match rx.recv().await.unwrap() {
            RestaurantEvent::RestaurantDetailsUpdated(event) => {
                assert_eq!(event.version, found.version);
                assert!(event.phone_number.is_none());
                assert!(event.cuisine.is_none());
                assert!(event.address.is_none());
                assert!(event.location.is_none());
            }
            other => panic!("Expected details event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_phone_change_clears_verification() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        // Verify the listing first
        h.service.generate_otp(&owner(), &id).await.unwrap();
        h.service.verify_otp(&owner(), &id, "424242").await.unwrap();
        assert!(h.service.find_by_id(&id, None).await.unwrap().is_verified);

        let mut rx = h.publisher.subscribe();
        let mut changed = details("Casa Nova", "T1");
        changed.phone_number = "+34699999999".to_string();
        h.service.update(&owner(), &id, changed).await.unwrap();

        let found = h.service.find_by_id(&id, None).await.unwrap();
        assert!(!found.is_verified);
        assert_eq!(found.phone_number, "+34699999999");

        match rx.recv().await.unwrap() {
            RestaurantEvent::RestaurantDetailsUpdated(event) => {
                assert_eq!(event.phone_number.as_deref(), Some("+34699999999"));
            }
            other => panic!("Expected details event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_with_same_phone_keeps_verification() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        h.service.generate_otp(&owner(), &id).await.unwrap();
        h.service.verify_otp(&owner(), &id, "424242").await.unwrap();

        let mut changed = details("Casa Nova", "T1");
        changed.cuisine = vec!["fusion".to_string()];
        h.service.update(&owner(), &id, changed).await.unwrap();

        assert!(h.service.find_by_id(&id, None).await.unwrap().is_verified);
    }

    #[tokio::test]
    async fn test_update_requires_ownership() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        let err = h
            .service
            .update(&stranger(), &id, details("Casa Nova", "T1"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotOwner);
    }

    // ==================== Modification decision ====================

    #[tokio::test]
    async fn test_modification_approval_rewrites_primary() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;
        h.service
            .update(&owner(), &id, details("Trattoria", "T2"))
            .await
            .unwrap();

        let mut rx = h.publisher.subscribe();
        h.service
            .decide_modification(&admin(), &id, ModerationDecision::Approved, "ok".to_string())
            .await
            .unwrap();

        let found = h.service.find_by_id(&id, None).await.unwrap();
        assert_eq!(found.name, "Trattoria");
        assert_eq!(found.slug, "trattoria");
        assert_eq!(found.tax_id, "T2");

        match rx.recv().await.unwrap() {
            RestaurantEvent::RestaurantUpdated(event) => {
                assert_eq!(event.name, "Trattoria");
                assert_eq!(event.slug, "trattoria");
                assert_eq!(event.version, found.version);
            }
            other => panic!("Expected updated event, got {:?}", other),
        }

        // Request destroyed, audit entry appended
        let rid = found.id.unwrap();
        assert!(h.modifications.find_by_restaurant(&rid).await.unwrap().is_none());
        let records = h.moderation.by_restaurant(&rid).await.unwrap();
        assert!(
            records
                .iter()
                .any(|r| r.record_kind == RecordKind::Modification)
        );
    }

    #[tokio::test]
    async fn test_modification_rejection_destroys_request_silently() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;
        h.service
            .update(&owner(), &id, details("Trattoria", "T2"))
            .await
            .unwrap();

        let mut rx = h.publisher.subscribe();
        h.service
            .decide_modification(&admin(), &id, ModerationDecision::Rejected, "no".to_string())
            .await
            .unwrap();

        let found = h.service.find_by_id(&id, None).await.unwrap();
        assert_eq!(found.name, "Casa Nova");
        assert!(
            h.modifications
                .find_by_restaurant(found.id.as_ref().unwrap())
                .await
                .unwrap()
                .is_none()
        );
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_modification_decision_without_request_fails() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;

        let err = h
            .service
            .decide_modification(&admin(), &id, ModerationDecision::Approved, String::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ModificationRequestNotFound);
    }

    // ==================== Delete ====================

    #[tokio::test]
    async fn test_delete_approved_is_soft_and_emits() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;

        let mut rx = h.publisher.subscribe();
        h.service.delete(&owner(), &id).await.unwrap();

        // Hidden from the default lookup, still present raw
        let err = h.service.find_by_id(&id, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RestaurantNotFound);
        let raw = h.restaurants.find_by_id_raw(&id).await.unwrap().unwrap();
        assert!(raw.is_deleted);
        assert_eq!(raw.status, ListingStatus::Approved);

        // Excluded from public projections
        assert!(h.service.approved_slugs().await.unwrap().is_empty());
        assert_eq!(h.service.get_approved(0, 10).await.unwrap().count, Some(0));

        match rx.recv().await.unwrap() {
            RestaurantEvent::RestaurantDeleted(event) => {
                assert_eq!(event.id, id);
                assert_eq!(event.version, raw.version);
            }
            other => panic!("Expected deleted event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_pending_is_hard_and_silent() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        let mut rx = h.publisher.subscribe();
        h.service.delete(&owner(), &id).await.unwrap();

        assert!(h.restaurants.find_by_id_raw(&id).await.unwrap().is_none());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_delete_authorization() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        let err = h.service.delete(&stranger(), &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotOwner);

        // Admins may remove listings they do not own
        h.service.delete(&admin(), &id).await.unwrap();
    }

    // ==================== Images ====================

    #[tokio::test]
    async fn test_add_images_requires_approval() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        let err = h
            .service
            .add_images(&owner(), &id, vec![png_upload("a.png")])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_add_images_appends_and_emits() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;

        let mut rx = h.publisher.subscribe();
        let images = h
            .service
            .add_images(&owner(), &id, vec![png_upload("a.png"), png_upload("b.png")])
            .await
            .unwrap();

        assert_eq!(images.len(), 2);
        match rx.recv().await.unwrap() {
            RestaurantEvent::RestaurantDetailsUpdated(event) => {
                assert_eq!(event.images.as_ref().map(Vec::len), Some(2));
            }
            other => panic!("Expected details event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_images_enforces_cap() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;

        // Seed the record just below the cap
        let mut found = h.restaurants.find_by_id(&id).await.unwrap().unwrap();
        found.images = (0..9).map(|i| format!("seed-{i}.jpg")).collect();
        h.restaurants.save(&found).await.unwrap();

        let err = h
            .service
            .add_images(&owner(), &id, vec![png_upload("a.png"), png_upload("b.png")])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TooManyImages);

        // A single image still fits
        let images = h
            .service
            .add_images(&owner(), &id, vec![png_upload("a.png")])
            .await
            .unwrap();
        assert_eq!(images.len(), 10);
    }

    #[tokio::test]
    async fn test_add_images_tolerates_partial_failure() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;
        approve(&h, &id).await;

        let images = h
            .service
            .add_images(
                &owner(),
                &id,
                vec![png_upload("good.png"), png_upload("bad.png")],
            )
            .await
            .unwrap();

        // The failed upload is dropped silently; the good one lands
        assert_eq!(images.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_images_has_no_status_gate() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        let mut found = h.restaurants.find_by_id(&id).await.unwrap().unwrap();
        found.images = vec!["a.jpg".to_string(), "b.jpg".to_string()];
        h.restaurants.save(&found).await.unwrap();

        h.service
            .remove_images(&owner(), &id, vec!["a.jpg".to_string()])
            .await
            .unwrap();

        let found = h.service.find_by_id(&id, None).await.unwrap();
        assert_eq!(found.images, vec!["b.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_replace_cover_removes_previous_after_persist() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        let first = h
            .service
            .replace_cover(&owner(), &id, png_upload("one.png"))
            .await
            .unwrap();
        let second = h
            .service
            .replace_cover(&owner(), &id, png_upload("two.png"))
            .await
            .unwrap();

        let found = h.service.find_by_id(&id, None).await.unwrap();
        assert_eq!(found.cover.as_deref(), Some(second.as_str()));

        let cover_dir = h
            .storage_root
            .join(format!("{}/cover", found.id.unwrap().key()));
        assert!(!cover_dir.join(&first).exists());
        assert!(cover_dir.join(&second).exists());
    }

    // ==================== Verification ====================

    #[tokio::test]
    async fn test_otp_full_scenario() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        // Only the owner may request a code
        let err = h.service.generate_otp(&stranger(), &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotOwner);

        let ttl = h.service.generate_otp(&owner(), &id).await.unwrap();
        assert_eq!(ttl, 120);

        // A wrong code fails and leaves the cached entry untouched
        let err = h
            .service
            .verify_otp(&owner(), &id, "000000")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::VerificationCodeInvalid);
        let cached: Option<String> = h.cache.get(&id).await.unwrap();
        assert_eq!(cached.as_deref(), Some("424242"));

        // The right code flips the flag and destroys the entry
        h.service.verify_otp(&owner(), &id, "424242").await.unwrap();
        assert!(h.service.find_by_id(&id, None).await.unwrap().is_verified);
        let cached: Option<String> = h.cache.get(&id).await.unwrap();
        assert_eq!(cached, None);

        // Further issuance and verification are refused
        let err = h.service.generate_otp(&owner(), &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyVerified);
        let err = h
            .service
            .verify_otp(&owner(), &id, "424242")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyVerified);
    }

    #[tokio::test]
    async fn test_verify_without_issued_code_fails() {
        let h = harness().await;
        let id = submit(&h, "Casa Nova", "T1").await;

        // Cache miss reads the same as a mismatch
        let err = h
            .service
            .verify_otp(&owner(), &id, "424242")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::VerificationCodeInvalid);
    }
}
