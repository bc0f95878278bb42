use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    context::RequestContext,
    error::{AppError, ManagerError},
    state::AppState,
};

/// The cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// A middleware that requires a valid session to be present.
///
/// Resolves the `session_id` cookie through the session manager and records
/// the caller's identity in the [`RequestContext`]. A missing cookie or an
/// unknown session is `Unauthenticated`. A store outage is `Unavailable`.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
pub async fn require_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking authentication...");

    let session_id = cookies
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| {
            tracing::warn!("❌ No session_id cookie found");
            AppError::Unauthenticated
        })?;

    let user_id = match state.sessions.check(&session_id).await {
        Ok(user_id) => user_id,
        Err(ManagerError::StoreUnavailable(msg)) => return Err(AppError::Unavailable(msg)),
        Err(e) => {
            tracing::warn!("❌ Session rejected: {}", e);
            return Err(AppError::Unauthenticated);
        }
    };

    tracing::debug!("✅ User authenticated: {}", user_id);

    match request.extensions_mut().get_mut::<RequestContext>() {
        Some(ctx) => ctx.user_id = Some(user_id),
        None => {
            request.extensions_mut().insert(RequestContext {
                user_id: Some(user_id),
                ..Default::default()
            });
        }
    }

    Ok(next.run(request).await)
}
