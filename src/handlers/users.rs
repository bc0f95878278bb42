use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    context::{CurrentUser, RequestContext},
    error::Result,
    middleware_layer::csrf::CSRF_HEADER,
    models::user::User,
    response::Envelope,
    state::AppState,
    validation::input::{ValidJson, validate_id, validate_password},
};

/// The request payload for editing the caller's profile.
#[derive(Deserialize, Validate)]
pub struct UserInfoRequest {
    #[garde(length(min = 1, max = 64))]
    pub name: String,
    #[serde(default)]
    #[garde(length(max = 64))]
    pub surname: String,
    #[serde(default)]
    #[garde(length(max = 1024))]
    pub about: String,
    /// Left unchanged when empty.
    #[serde(default)]
    #[garde(length(max = 2048))]
    pub img_url: String,
}

/// The request payload for changing the caller's password.
#[derive(Deserialize, Validate)]
pub struct PasswordRequest {
    #[garde(skip)]
    pub password: String,
}

#[derive(Serialize)]
pub struct Subscription {
    pub subscribed: bool,
}

fn path_id(ctx: &RequestContext) -> Result<&str> {
    let id = ctx.route_vars.require("id")?;
    validate_id(id)?;
    Ok(id)
}

/// Returns the caller's profile and issues a CSRF token in `X-CSRF-Token`.
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response> {
    let user = state.call(state.users.get_user_by_id(user_id.as_str())).await?;
    let token = state.csrf.create(&user_id).await?;

    Ok(([(CSRF_HEADER, token)], Envelope::ok(user)).into_response())
}

#[axum::debug_handler]
pub async fn get_user(State(state): State<AppState>, ctx: RequestContext) -> Result<Response> {
    let id = path_id(&ctx)?;
    let user = state.call(state.users.get_user_by_id(id)).await?;
    Ok(Envelope::ok(user).into_response())
}

#[axum::debug_handler]
pub async fn get_subscribers(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    let users = state.call(state.users.get_subscribers(id)).await?;
    Ok(Envelope::ok(users).into_response())
}

#[axum::debug_handler]
pub async fn get_subscribes(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    let users = state.call(state.users.get_subscribes(id)).await?;
    Ok(Envelope::ok(users).into_response())
}

/// Users who marked the event in the path as visited.
#[axum::debug_handler]
pub async fn get_visitors(State(state): State<AppState>, ctx: RequestContext) -> Result<Response> {
    let id = path_id(&ctx)?;
    let users = state.call(state.users.get_visitors(id)).await?;
    Ok(Envelope::ok(users).into_response())
}

/// Whether the caller is subscribed to the user in the path.
#[axum::debug_handler]
pub async fn is_subscribed(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    let subscribed = state
        .call(state.users.is_subscribed(id, user_id.as_str()))
        .await?;
    Ok(Envelope::ok(Subscription { subscribed }).into_response())
}

#[axum::debug_handler]
pub async fn update_info(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidJson(payload): ValidJson<UserInfoRequest>,
) -> Result<Response> {
    let update = User {
        id: user_id.to_string(),
        name: payload.name,
        surname: payload.surname,
        about: payload.about,
        img_url: payload.img_url,
        ..Default::default()
    };
    state.call(state.users.update_user_info(update)).await?;

    tracing::info!("✅ Profile updated for user: {}", user_id);
    Ok(Envelope::ok("Profile updated").into_response())
}

/// Changes the caller's password, then notifies them out of band.
///
/// The notification is best-effort and never delays or fails the response.
#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidJson(payload): ValidJson<PasswordRequest>,
) -> Result<Response> {
    validate_password(&payload.password)?;
    state
        .call(state.users.update_user_password(user_id.as_str(), &payload.password))
        .await?;
    tracing::info!("✅ Password changed for user: {}", user_id);

    let notify_state = state.clone();
    tokio::spawn(async move {
        let user = match notify_state
            .call(notify_state.users.get_user_by_id(user_id.as_str()))
            .await
        {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("⚠️ No password notice for {}: {}", user_id, e);
                return;
            }
        };

        if let Err(e) = notify_state
            .notifier
            .notify(
                &user.mail,
                "Password changed",
                "The password of your account was changed.",
            )
            .await
        {
            tracing::warn!("⚠️ Password notice to {} failed: {}", user_id, e);
        }
    });

    Ok(Envelope::ok("Password changed successfully").into_response())
}

#[axum::debug_handler]
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    state.call(state.users.subscribe(id, user_id.as_str())).await?;
    Ok(Envelope::ok(Subscription { subscribed: true }).into_response())
}

#[axum::debug_handler]
pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    state.call(state.users.unsubscribe(id, user_id.as_str())).await?;
    Ok(Envelope::ok(Subscription { subscribed: false }).into_response())
}
