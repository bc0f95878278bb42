//! The RPC front of the `domain-services` process.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ServiceError;
use crate::rpc::messages::{
    AUTH_PATH, AuthCall, EVENT_PATH, EventCall, RpcReply, USER_PATH, UserCall,
};
use crate::services::auth::AuthService;
use crate::services::event::EventService;
use crate::services::user::UserService;

#[derive(Clone)]
struct RpcState {
    users: Arc<dyn UserService>,
    events: Arc<dyn EventService>,
    auth: Arc<dyn AuthService>,
}

/// Exposes the three services under [`USER_PATH`], [`EVENT_PATH`] and [`AUTH_PATH`].
pub fn router(
    users: Arc<dyn UserService>,
    events: Arc<dyn EventService>,
    auth: Arc<dyn AuthService>,
) -> Router {
    Router::new()
        .route(USER_PATH, post(user_rpc))
        .route(EVENT_PATH, post(event_rpc))
        .route(AUTH_PATH, post(auth_rpc))
        .with_state(RpcState {
            users,
            events,
            auth,
        })
}

fn decode<C: DeserializeOwned>(body: &Bytes) -> Result<C, Response> {
    sonic_rs::from_slice(body).map_err(|e| {
        tracing::warn!("❌ Malformed RPC call: {}", e);
        reply::<()>(Err(ServiceError::InvalidInput(format!("Malformed call: {}", e))))
    })
}

fn reply<T: Serialize>(result: Result<T, ServiceError>) -> Response {
    match sonic_rs::to_string(&RpcReply::from(result)) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!("❌ RPC reply serialization failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn user_rpc(State(state): State<RpcState>, body: Bytes) -> Response {
    let call: UserCall = match decode(&body) {
        Ok(call) => call,
        Err(response) => return response,
    };
    let users = &state.users;

    match call {
        UserCall::GetUserById { user_id } => reply(users.get_user_by_id(&user_id).await),
        UserCall::UpdateUserInfo { user } => reply(users.update_user_info(user).await),
        UserCall::UpdateUserPassword { user_id, password } => {
            reply(users.update_user_password(&user_id, &password).await)
        }
        UserCall::GetSubscribers { user_id } => reply(users.get_subscribers(&user_id).await),
        UserCall::GetSubscribes { user_id } => reply(users.get_subscribes(&user_id).await),
        UserCall::GetVisitors { event_id } => reply(users.get_visitors(&event_id).await),
        UserCall::Subscribe {
            subscribed_id,
            subscriber_id,
        } => reply(users.subscribe(&subscribed_id, &subscriber_id).await),
        UserCall::Unsubscribe {
            subscribed_id,
            subscriber_id,
        } => reply(users.unsubscribe(&subscribed_id, &subscriber_id).await),
        UserCall::IsSubscribed {
            subscribed_id,
            subscriber_id,
        } => reply(users.is_subscribed(&subscribed_id, &subscriber_id).await),
    }
}

async fn event_rpc(State(state): State<RpcState>, body: Bytes) -> Response {
    let call: EventCall = match decode(&body) {
        Ok(call) => call,
        Err(response) => return response,
    };
    let events = &state.events;

    match call {
        EventCall::CreateEvent { event } => reply(events.create_event(event).await),
        EventCall::UpdateEvent { event, user_id } => {
            reply(events.update_event(event, &user_id).await)
        }
        EventCall::DeleteEvent { event_id, user_id } => {
            reply(events.delete_event(&event_id, &user_id).await)
        }
        EventCall::GetEventById { event_id } => reply(events.get_event_by_id(&event_id).await),
        EventCall::GetEvents { filter } => reply(events.get_events(filter).await),
        EventCall::GetCreatedEvents { author_id } => {
            reply(events.get_created_events(&author_id).await)
        }
        EventCall::Visit { event_id, user_id } => reply(events.visit(&event_id, &user_id).await),
        EventCall::Unvisit { event_id, user_id } => {
            reply(events.unvisit(&event_id, &user_id).await)
        }
        EventCall::IsVisited { event_id, user_id } => {
            reply(events.is_visited(&event_id, &user_id).await)
        }
        EventCall::GetVisitedEvents { user_id } => {
            reply(events.get_visited_events(&user_id).await)
        }
        EventCall::GetCities => reply(events.get_cities().await),
    }
}

async fn auth_rpc(State(state): State<RpcState>, body: Bytes) -> Response {
    let call: AuthCall = match decode(&body) {
        Ok(call) => call,
        Err(response) => return response,
    };

    match call {
        AuthCall::SignUp { user } => reply(state.auth.sign_up(user).await),
        AuthCall::SignIn { mail, password } => reply(state.auth.sign_in(&mail, &password).await),
    }
}
