//! Messages exchanged between the gateway and the `domain-services` process.
//!
//! Every call is a `POST` to the service's path with a method-tagged body,
//! e.g. `{"method":"get_user_by_id","params":{"user_id":"42"}}`. Every reply
//! is `{"status":"ok","body":..}` or `{"status":"error","body":{kind,message}}`.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::models::event::{Event, EventFilter};
use crate::models::user::{NewUser, User};

pub const USER_PATH: &str = "/rpc/user";
pub const EVENT_PATH: &str = "/rpc/event";
pub const AUTH_PATH: &str = "/rpc/auth";

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum UserCall {
    GetUserById { user_id: String },
    UpdateUserInfo { user: User },
    UpdateUserPassword { user_id: String, password: String },
    GetSubscribers { user_id: String },
    GetSubscribes { user_id: String },
    GetVisitors { event_id: String },
    Subscribe { subscribed_id: String, subscriber_id: String },
    Unsubscribe { subscribed_id: String, subscriber_id: String },
    IsSubscribed { subscribed_id: String, subscriber_id: String },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum EventCall {
    CreateEvent { event: Event },
    UpdateEvent { event: Event, user_id: String },
    DeleteEvent { event_id: String, user_id: String },
    GetEventById { event_id: String },
    GetEvents { filter: EventFilter },
    GetCreatedEvents { author_id: String },
    Visit { event_id: String, user_id: String },
    Unvisit { event_id: String, user_id: String },
    IsVisited { event_id: String, user_id: String },
    GetVisitedEvents { user_id: String },
    GetCities,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum AuthCall {
    SignUp { user: NewUser },
    SignIn { mail: String, password: String },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", content = "body", rename_all = "snake_case")]
pub enum RpcReply<T> {
    Ok(T),
    Error(RpcFault),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    NotFound,
    Forbidden,
    InvalidInput,
    Unavailable,
}

/// A domain error carried over the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcFault {
    pub kind: FaultKind,
    #[serde(default)]
    pub message: String,
}

impl From<ServiceError> for RpcFault {
    fn from(e: ServiceError) -> Self {
        let (kind, message) = match e {
            ServiceError::NotFound => (FaultKind::NotFound, String::new()),
            ServiceError::Forbidden => (FaultKind::Forbidden, String::new()),
            ServiceError::InvalidInput(msg) => (FaultKind::InvalidInput, msg),
            ServiceError::Unavailable(msg) => (FaultKind::Unavailable, msg),
        };
        Self { kind, message }
    }
}

impl From<RpcFault> for ServiceError {
    fn from(fault: RpcFault) -> Self {
        match fault.kind {
            FaultKind::NotFound => ServiceError::NotFound,
            FaultKind::Forbidden => ServiceError::Forbidden,
            FaultKind::InvalidInput => ServiceError::InvalidInput(fault.message),
            FaultKind::Unavailable => ServiceError::Unavailable(fault.message),
        }
    }
}

impl<T> From<Result<T, ServiceError>> for RpcReply<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(value) => RpcReply::Ok(value),
            Err(e) => RpcReply::Error(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_are_method_tagged() {
        let call = UserCall::GetUserById { user_id: "42".into() };
        assert_eq!(
            sonic_rs::to_string(&call).unwrap(),
            r#"{"method":"get_user_by_id","params":{"user_id":"42"}}"#
        );

        let call: EventCall = sonic_rs::from_str(r#"{"method":"get_cities"}"#).unwrap();
        assert!(matches!(call, EventCall::GetCities));
    }

    #[test]
    fn invalid_input_keeps_its_message() {
        let fault = RpcFault::from(ServiceError::InvalidInput("Empty id".into()));
        let json = sonic_rs::to_string(&RpcReply::<()>::Error(fault)).unwrap();

        let reply: RpcReply<()> = sonic_rs::from_str(&json).unwrap();
        match reply {
            RpcReply::Error(fault) => assert_eq!(
                ServiceError::from(fault),
                ServiceError::InvalidInput("Empty id".into())
            ),
            RpcReply::Ok(()) => panic!("expected an error reply"),
        }
    }
}
