//! Authentication middleware
//!
//! Axum middleware for JWT authentication and role gating

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;

/// Authentication middleware - requires a logged-in user
///
/// Extracts and validates the JWT from `Authorization: Bearer <token>`.
/// On success the [`CurrentUser`] is injected into the request extensions.
///
/// Skipped for:
/// - `OPTIONS *` (CORS preflight)
/// - non-`/api/` paths (they 404 normally)
/// - public listing reads (`GET /api/restaurant`, slug/id lookups)
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // Allow CORS preflight without credentials
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Non-API routes skip auth (they 404 normally)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // Public read-only listing routes skip auth
    if req.method() == http::Method::GET && is_public_listing_path(path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            tracing::warn!(uri = %req.uri(), "Missing authorization header");
            return Err(AppError::unauthorized());
        }
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::try_from(claims)
                .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))?;
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(error = %e, uri = %req.uri(), "Token validation failed");

            match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// Admin gate - layered onto admin-only routes after [`require_auth`]
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::unauthorized)?;

    if !user.role.is_admin() {
        tracing::warn!(user_id = %user.id, uri = %req.uri(), "Admin route denied");
        return Err(AppError::new(crate::utils::ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}

fn is_public_listing_path(path: &str) -> bool {
    path == "/api/restaurant"
        || path == "/api/restaurant/slugs"
        || path.starts_with("/api/restaurant/slug/")
        || is_public_restaurant_id_path(path)
}

/// `GET /api/restaurant/{id}` is public, but the fixed sub-resources
/// (`user`, `pending`, `all`) under the same prefix are not.
fn is_public_restaurant_id_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/api/restaurant/") else {
        return false;
    };
    !rest.is_empty()
        && !rest.contains('/')
        && !matches!(rest, "user" | "pending" | "all" | "slugs")
}
