//! Restaurant Handlers
//!
//! HTTP-facing glue for the lifecycle engine: request DTOs, validation,
//! multipart decoding, and response envelopes. All business rules live
//! in [`RestaurantService`].

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{ModerationDecision, ModerationRecord, Restaurant, RestaurantDetails};
use crate::services::restaurant::ApprovedPage;
use crate::services::storage::ImageUpload;
use crate::utils::validation::validate_dto;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::types::{Address, GeoPoint};

// ==================== DTOs ====================

/// Full editable field set, used by both create and update
#[derive(Debug, Deserialize, Validate)]
pub struct RestaurantPayload {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "tax_id must be 1-50 characters"))]
    pub tax_id: String,
    pub cuisine: Vec<String>,
    pub address: Address,
    pub location: GeoPoint,
    #[validate(length(min = 5, max = 20, message = "phone_number must be 5-20 characters"))]
    pub phone_number: String,
}

impl RestaurantPayload {
    fn into_details(self) -> RestaurantDetails {
        RestaurantDetails {
            name: self.name,
            tax_id: self.tax_id,
            cuisine: self.cuisine,
            address: self.address,
            location: self.location,
            phone_number: self.phone_number,
        }
    }
}

/// Admin decision payload (listing approval and modification review)
#[derive(Debug, Deserialize, Validate)]
pub struct DecisionPayload {
    pub status: ModerationDecision,
    #[validate(length(max = 500, message = "remarks must be at most 500 characters"))]
    #[serde(default)]
    pub remarks: String,
}

/// OTP submission
#[derive(Debug, Deserialize, Validate)]
pub struct OtpPayload {
    #[validate(length(equal = 6, message = "otp must be 6 digits"))]
    pub otp: String,
}

/// Image removal payload
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteImagesPayload {
    #[validate(length(min = 1, message = "at least one image reference required"))]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SlugResponse {
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct TtlResponse {
    pub ttl: u64,
}

#[derive(Debug, Serialize)]
pub struct CoverResponse {
    pub cover: String,
}

// ==================== Queries ====================

/// `GET /api/restaurant` - approved listings, paginated (public)
pub async fn get_approved(
    State(state): State<ServerState>,
    Query(query): Query<PaginationQuery>,
) -> AppResult<ApiResponse<ApprovedPage>> {
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(state.config.default_page_size);
    let page = state.restaurants.get_approved(offset, limit).await?;
    Ok(ApiResponse::success(page))
}

/// `GET /api/restaurant/all` - every record (admin)
pub async fn get_all(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Restaurant>>> {
    Ok(ApiResponse::success(state.restaurants.get_all().await?))
}

/// `GET /api/restaurant/pending` - moderation queue (admin)
pub async fn get_pending(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<Vec<Restaurant>>> {
    Ok(ApiResponse::success(state.restaurants.get_pending().await?))
}

/// `GET /api/restaurant/user` - the caller's listings
pub async fn get_user_restaurants(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<Restaurant>>> {
    Ok(ApiResponse::success(
        state.restaurants.get_by_user(&user).await?,
    ))
}

/// `GET /api/restaurant/slugs` - approved slug list (public)
pub async fn get_slugs(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<String>>> {
    Ok(ApiResponse::success(
        state.restaurants.approved_slugs().await?,
    ))
}

/// `GET /api/restaurant/slug/{slug}` - lookup by slug (public)
pub async fn get_by_slug(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<Restaurant>> {
    Ok(ApiResponse::success(
        state.restaurants.find_by_slug(&slug).await?,
    ))
}

/// `GET /api/restaurant/{id}` - lookup by id (public, non-deleted)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Restaurant>> {
    Ok(ApiResponse::success(
        state.restaurants.find_by_id(&id, None).await?,
    ))
}

/// `GET /api/moderation/records` - recent decisions (admin)
pub async fn moderation_records(
    State(state): State<ServerState>,
    Query(query): Query<RecordsQuery>,
) -> AppResult<ApiResponse<Vec<ModerationRecord>>> {
    let limit = query.limit.unwrap_or(50);
    Ok(ApiResponse::success(
        state.restaurants.moderation_records(limit).await?,
    ))
}

// ==================== Commands ====================

/// `POST /api/restaurant` - submit a new listing
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<RestaurantPayload>,
) -> AppResult<ApiResponse<SlugResponse>> {
    validate_dto(&payload)?;
    let slug = state
        .restaurants
        .create(&user, payload.into_details())
        .await?;
    Ok(ApiResponse::success(SlugResponse { slug }))
}

/// `PUT /api/restaurant/{id}` - owner edit
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<RestaurantPayload>,
) -> AppResult<ApiResponse<()>> {
    validate_dto(&payload)?;
    state
        .restaurants
        .update(&user, &id, payload.into_details())
        .await?;
    Ok(ApiResponse::success_with_message("Restaurant updated", ()))
}

/// `PATCH /api/restaurant/{id}/status` - listing decision (admin)
pub async fn decide_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<DecisionPayload>,
) -> AppResult<ApiResponse<()>> {
    validate_dto(&payload)?;
    state
        .restaurants
        .decide_listing(&user, &id, payload.status, payload.remarks)
        .await?;
    Ok(ApiResponse::success_with_message("Status updated", ()))
}

/// `PATCH /api/restaurant/{id}/request` - modification decision (admin)
pub async fn decide_request(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<DecisionPayload>,
) -> AppResult<ApiResponse<()>> {
    validate_dto(&payload)?;
    state
        .restaurants
        .decide_modification(&user, &id, payload.status, payload.remarks)
        .await?;
    Ok(ApiResponse::success_with_message("Request resolved", ()))
}

/// `DELETE /api/restaurant/{id}` - owner/admin removal
pub async fn delete_restaurant(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> AppResult<ApiResponse<()>> {
    state.restaurants.delete(&user, &id).await?;
    Ok(ApiResponse::success_with_message("Restaurant deleted", ()))
}

// ==================== Verification ====================

/// `POST /api/restaurant/{id}/otp` - issue a verification code
pub async fn generate_otp(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> AppResult<ApiResponse<TtlResponse>> {
    let ttl = state.restaurants.generate_otp(&user, &id).await?;
    Ok(ApiResponse::success(TtlResponse { ttl }))
}

/// `POST /api/restaurant/{id}/otp/verify` - submit a verification code
pub async fn verify_otp(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<OtpPayload>,
) -> AppResult<ApiResponse<()>> {
    validate_dto(&payload)?;
    state
        .restaurants
        .verify_otp(&user, &id, &payload.otp)
        .await?;
    Ok(ApiResponse::success_with_message("Phone verified", ()))
}

// ==================== Images ====================

/// Pull every file field out of a multipart request
async fn collect_uploads(multipart: &mut Multipart) -> AppResult<Vec<ImageUpload>> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart request: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        if !matches!(name.as_deref(), Some("file") | Some("files")) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::new(ErrorCode::NoFilename))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read upload: {e}")))?
            .to_vec();

        uploads.push(ImageUpload { filename, data });
    }

    if uploads.is_empty() {
        return Err(AppError::new(ErrorCode::NoFileProvided));
    }

    Ok(uploads)
}

/// `POST /api/restaurant/{id}/images` - add gallery images (multipart)
pub async fn add_images(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<Vec<String>>> {
    let uploads = collect_uploads(&mut multipart).await?;
    let images = state.restaurants.add_images(&user, &id, uploads).await?;
    Ok(ApiResponse::success(images))
}

/// `DELETE /api/restaurant/{id}/images` - remove gallery images
pub async fn remove_images(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<DeleteImagesPayload>,
) -> AppResult<ApiResponse<()>> {
    validate_dto(&payload)?;
    state
        .restaurants
        .remove_images(&user, &id, payload.images)
        .await?;
    Ok(ApiResponse::success_with_message("Image(s) deleted", ()))
}

/// `PUT /api/restaurant/{id}/cover` - replace the cover image (multipart)
pub async fn replace_cover(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<CoverResponse>> {
    let mut uploads = collect_uploads(&mut multipart).await?;
    let upload = uploads.remove(0);
    let cover = state.restaurants.replace_cover(&user, &id, upload).await?;
    Ok(ApiResponse::success(CoverResponse { cover }))
}
