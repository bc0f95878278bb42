use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::{SameSite, time::Duration};
use tower_cookies::{Cookie, Cookies};

use crate::{
    context::{CurrentUser, UserId},
    error::{AppError, Result},
    middleware_layer::auth::SESSION_COOKIE,
    models::user::NewUser,
    response::Envelope,
    state::AppState,
    validation::input::{ValidJson, validate_password},
};

/// The request payload for user registration.
#[derive(Deserialize, Validate)]
pub struct SignUpRequest {
    #[garde(length(min = 1, max = 64))]
    pub name: String,
    #[serde(default)]
    #[garde(length(max = 64))]
    pub surname: String,
    #[garde(email)]
    pub mail: String,
    #[garde(skip)]
    pub password: String,
    #[serde(default)]
    #[garde(length(max = 1024))]
    pub about: String,
}

/// The request payload for user login.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(email)]
    pub mail: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// The response payload when a session starts.
#[derive(Serialize)]
pub struct SessionStarted {
    pub user_id: String,
}

/// Creates the session cookie. `Secure` is set only in production.
fn create_session_cookie(value: String, max_age_secs: u64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);

    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::seconds(i64::try_from(max_age_secs).unwrap_or(i64::MAX)));
    cookie.set_path("/");

    cookie
}

async fn start_session(state: &AppState, cookies: &Cookies, user_id: &UserId) -> Result<()> {
    let session_id = state.sessions.create(user_id).await?;

    cookies.add(create_session_cookie(
        session_id,
        state.sessions.ttl().as_secs(),
        state.config.secure_cookies,
    ));
    tracing::debug!("✅ Session cookie added for user: {}", user_id);
    Ok(())
}

/// Handles user registration and opens a session for the new user.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidJson(payload): ValidJson<SignUpRequest>,
) -> Result<Response> {
    tracing::info!("📝 Register attempt for: {}", payload.mail);
    validate_password(&payload.password)?;

    let new_user = NewUser {
        name: payload.name,
        surname: payload.surname,
        mail: payload.mail,
        password: payload.password,
        about: payload.about,
    };
    let user_id = UserId::from(state.call(state.auth.sign_up(new_user)).await?);
    tracing::info!("✅ User registered: {}", user_id);

    start_session(&state, &cookies, &user_id).await?;

    let body = SessionStarted {
        user_id: user_id.to_string(),
    };
    Ok((StatusCode::CREATED, Envelope::ok(body)).into_response())
}

/// Handles user login.
///
/// Wrong credentials and unknown users are both `Unauthenticated`.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt for: {}", payload.mail);

    let user_id = state
        .call(state.auth.sign_in(&payload.mail, &payload.password))
        .await
        .map_err(|e| match e {
            AppError::Forbidden(_) | AppError::NotFound => AppError::Unauthenticated,
            other => other,
        })?;
    let user_id = UserId::from(user_id);

    start_session(&state, &cookies, &user_id).await?;
    tracing::info!("✅ User logged in: {}", user_id);

    let body = SessionStarted {
        user_id: user_id.to_string(),
    };
    Ok(Envelope::ok(body).into_response())
}

/// Handles user logout.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    cookies: Cookies,
) -> Result<Response> {
    tracing::info!("👋 Logout for user: {}", user_id);

    let session_id = cookies
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::Unauthenticated)?;

    state.sessions.delete(&session_id).await?;

    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    tracing::info!("✅ User logged out: {}", user_id);
    Ok(Envelope::ok("Logout successful").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = create_session_cookie("abc".to_string(), 3600, false);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), None);
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(3600)));
    }

    #[test]
    fn production_cookie_is_secure() {
        let cookie = create_session_cookie("abc".to_string(), 3600, true);
        assert_eq!(cookie.secure(), Some(true));
    }
}
