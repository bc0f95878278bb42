use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::{
    context::RequestContext,
    error::{AppError, ManagerError},
    state::AppState,
};

/// The header carrying the anti-forgery token, both issued and presented.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// A middleware that verifies the CSRF token.
///
/// Runs after session authentication. The token in the `X-CSRF-Token`
/// header must exist and be bound to the authenticated user. Safe methods
/// pass through.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `ctx` - The request context filled by the session middleware.
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
pub async fn verify_csrf(
    State(state): State<AppState>,
    ctx: RequestContext,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == Method::GET
        || req.method() == Method::HEAD
        || req.method() == Method::OPTIONS
    {
        tracing::debug!("✅ CSRF exemption: {} request", req.method());
        return Ok(next.run(req).await);
    }

    let user_id = ctx.user_id.ok_or_else(|| {
        tracing::warn!("❌ CSRF: no authenticated user in context");
        AppError::Unauthenticated
    })?;

    let token = match req.headers().get(CSRF_HEADER) {
        Some(value) => value.to_str().map(str::to_string).map_err(|_| {
            tracing::warn!("❌ CSRF: header has an invalid format");
            AppError::Forbidden("Invalid CSRF token format".to_string())
        })?,
        None => {
            tracing::warn!("❌ CSRF: x-csrf-token header not found");
            return Err(AppError::Forbidden("Missing CSRF token header".to_string()));
        }
    };

    match state.csrf.verify(&token, &user_id).await {
        Ok(()) => {
            tracing::debug!("✅ CSRF token valid");
            Ok(next.run(req).await)
        }
        Err(ManagerError::StoreUnavailable(msg)) => {
            tracing::error!("❌ CSRF: store error: {}", msg);
            Err(AppError::Unavailable(msg))
        }
        Err(ManagerError::TokenMismatch) => Err(AppError::Forbidden(
            "CSRF token does not match session".to_string(),
        )),
        Err(e) => {
            tracing::warn!("❌ CSRF: {}", e);
            Err(AppError::Forbidden("CSRF token expired or invalid".to_string()))
        }
    }
}
