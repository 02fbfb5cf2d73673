//! Restaurant routes
//!
//! Public reads, owner-scoped commands, and the admin moderation surface.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post, put};

use crate::auth::require_admin;
use crate::core::ServerState;
use crate::handler;

/// Multipart routes accept up to a full image batch (10 x 5MB) plus overhead
const UPLOAD_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Restaurant router - public reads and owner commands
pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/restaurant",
            post(handler::restaurant::create).get(handler::restaurant::get_approved),
        )
        .route(
            "/api/restaurant/user",
            get(handler::restaurant::get_user_restaurants),
        )
        .route("/api/restaurant/slugs", get(handler::restaurant::get_slugs))
        .route(
            "/api/restaurant/slug/{slug}",
            get(handler::restaurant::get_by_slug),
        )
        .route(
            "/api/restaurant/{id}",
            get(handler::restaurant::get_by_id)
                .put(handler::restaurant::update)
                .delete(handler::restaurant::delete_restaurant),
        )
        .route(
            "/api/restaurant/{id}/otp",
            post(handler::restaurant::generate_otp),
        )
        .route(
            "/api/restaurant/{id}/otp/verify",
            post(handler::restaurant::verify_otp),
        )
        .route(
            "/api/restaurant/{id}/images",
            post(handler::restaurant::add_images)
                .delete(handler::restaurant::remove_images)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/restaurant/{id}/cover",
            put(handler::restaurant::replace_cover).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}

/// Moderation router - requires authentication and admin access
pub fn admin_router() -> Router<ServerState> {
    Router::new()
        .route("/api/restaurant/all", get(handler::restaurant::get_all))
        .route(
            "/api/restaurant/pending",
            get(handler::restaurant::get_pending),
        )
        .route(
            "/api/restaurant/{id}/status",
            patch(handler::restaurant::decide_status),
        )
        .route(
            "/api/restaurant/{id}/request",
            patch(handler::restaurant::decide_request),
        )
        .route(
            "/api/moderation/records",
            get(handler::restaurant::moderation_records),
        )
        .route_layer(axum::middleware::from_fn(require_admin))
}
