//! Network-backed service clients.
//!
//! [`RemoteServices`] implements the same traits as the in-process
//! [`InMemoryDirectory`](crate::services::local::InMemoryDirectory), so the
//! gateway cannot tell where its collaborators live. Transport failures and
//! replies that do not parse surface as [`ServiceError::Unavailable`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::ServiceError;
use crate::models::event::{Event, EventFilter};
use crate::models::user::{NewUser, User};
use crate::rpc::messages::{
    AUTH_PATH, AuthCall, EVENT_PATH, EventCall, RpcReply, USER_PATH, UserCall,
};
use crate::services::auth::AuthService;
use crate::services::event::EventService;
use crate::services::user::UserService;

/// RPC clients for the user, event and auth services.
pub struct RemoteServices {
    client: Client,
    user_url: String,
    event_url: String,
    auth_url: String,
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

impl RemoteServices {
    /// Builds the clients. `timeout` bounds every call, connect included.
    pub fn new(
        user_base: &str,
        event_base: &str,
        auth_base: &str,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_url: endpoint(user_base, USER_PATH),
            event_url: endpoint(event_base, EVENT_PATH),
            auth_url: endpoint(auth_base, AUTH_PATH),
        })
    }

    async fn call<C, T>(&self, url: &str, call: &C) -> Result<T, ServiceError>
    where
        C: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = sonic_rs::to_string(call)
            .map_err(|e| ServiceError::InvalidInput(format!("Unencodable call: {}", e)))?;

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("❌ RPC to {} failed: {}", url, e);
                ServiceError::Unavailable(format!("{} unreachable", url))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("❌ RPC to {} answered {}", url, status);
            return Err(ServiceError::Unavailable(format!("{} answered {}", url, status)));
        }

        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!("❌ RPC reply from {} was cut short: {}", url, e);
            ServiceError::Unavailable(format!("{} reply interrupted", url))
        })?;

        let reply: RpcReply<T> = sonic_rs::from_slice(&bytes).map_err(|e| {
            tracing::warn!("❌ Malformed RPC reply from {}: {}", url, e);
            ServiceError::Unavailable(format!("{} sent a malformed reply", url))
        })?;

        match reply {
            RpcReply::Ok(value) => Ok(value),
            RpcReply::Error(fault) => Err(fault.into()),
        }
    }
}

#[async_trait]
impl UserService for RemoteServices {
    async fn get_user_by_id(&self, user_id: &str) -> Result<User, ServiceError> {
        let call = UserCall::GetUserById {
            user_id: user_id.to_string(),
        };
        self.call(&self.user_url, &call).await
    }

    async fn update_user_info(&self, user: User) -> Result<(), ServiceError> {
        self.call(&self.user_url, &UserCall::UpdateUserInfo { user })
            .await
    }

    async fn update_user_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let call = UserCall::UpdateUserPassword {
            user_id: user_id.to_string(),
            password: password.to_string(),
        };
        self.call(&self.user_url, &call).await
    }

    async fn get_subscribers(&self, user_id: &str) -> Result<Vec<User>, ServiceError> {
        let call = UserCall::GetSubscribers {
            user_id: user_id.to_string(),
        };
        self.call(&self.user_url, &call).await
    }

    async fn get_subscribes(&self, user_id: &str) -> Result<Vec<User>, ServiceError> {
        let call = UserCall::GetSubscribes {
            user_id: user_id.to_string(),
        };
        self.call(&self.user_url, &call).await
    }

    async fn get_visitors(&self, event_id: &str) -> Result<Vec<User>, ServiceError> {
        let call = UserCall::GetVisitors {
            event_id: event_id.to_string(),
        };
        self.call(&self.user_url, &call).await
    }

    async fn subscribe(
        &self,
        subscribed_id: &str,
        subscriber_id: &str,
    ) -> Result<(), ServiceError> {
        let call = UserCall::Subscribe {
            subscribed_id: subscribed_id.to_string(),
            subscriber_id: subscriber_id.to_string(),
        };
        self.call(&self.user_url, &call).await
    }

    async fn unsubscribe(
        &self,
        subscribed_id: &str,
        subscriber_id: &str,
    ) -> Result<(), ServiceError> {
        let call = UserCall::Unsubscribe {
            subscribed_id: subscribed_id.to_string(),
            subscriber_id: subscriber_id.to_string(),
        };
        self.call(&self.user_url, &call).await
    }

    async fn is_subscribed(
        &self,
        subscribed_id: &str,
        subscriber_id: &str,
    ) -> Result<bool, ServiceError> {
        let call = UserCall::IsSubscribed {
            subscribed_id: subscribed_id.to_string(),
            subscriber_id: subscriber_id.to_string(),
        };
        self.call(&self.user_url, &call).await
    }
}

#[async_trait]
impl EventService for RemoteServices {
    async fn create_event(&self, event: Event) -> Result<String, ServiceError> {
        self.call(&self.event_url, &EventCall::CreateEvent { event })
            .await
    }

    async fn update_event(&self, event: Event, user_id: &str) -> Result<(), ServiceError> {
        let call = EventCall::UpdateEvent {
            event,
            user_id: user_id.to_string(),
        };
        self.call(&self.event_url, &call).await
    }

    async fn delete_event(&self, event_id: &str, user_id: &str) -> Result<(), ServiceError> {
        let call = EventCall::DeleteEvent {
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.call(&self.event_url, &call).await
    }

    async fn get_event_by_id(&self, event_id: &str) -> Result<Event, ServiceError> {
        let call = EventCall::GetEventById {
            event_id: event_id.to_string(),
        };
        self.call(&self.event_url, &call).await
    }

    async fn get_events(&self, filter: EventFilter) -> Result<Vec<Event>, ServiceError> {
        self.call(&self.event_url, &EventCall::GetEvents { filter })
            .await
    }

    async fn get_created_events(&self, author_id: &str) -> Result<Vec<Event>, ServiceError> {
        let call = EventCall::GetCreatedEvents {
            author_id: author_id.to_string(),
        };
        self.call(&self.event_url, &call).await
    }

    async fn visit(&self, event_id: &str, user_id: &str) -> Result<(), ServiceError> {
        let call = EventCall::Visit {
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.call(&self.event_url, &call).await
    }

    async fn unvisit(&self, event_id: &str, user_id: &str) -> Result<(), ServiceError> {
        let call = EventCall::Unvisit {
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.call(&self.event_url, &call).await
    }

    async fn is_visited(&self, event_id: &str, user_id: &str) -> Result<bool, ServiceError> {
        let call = EventCall::IsVisited {
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.call(&self.event_url, &call).await
    }

    async fn get_visited_events(&self, user_id: &str) -> Result<Vec<Event>, ServiceError> {
        let call = EventCall::GetVisitedEvents {
            user_id: user_id.to_string(),
        };
        self.call(&self.event_url, &call).await
    }

    async fn get_cities(&self) -> Result<Vec<String>, ServiceError> {
        self.call(&self.event_url, &EventCall::GetCities).await
    }
}

#[async_trait]
impl AuthService for RemoteServices {
    async fn sign_up(&self, user: NewUser) -> Result<String, ServiceError> {
        self.call(&self.auth_url, &AuthCall::SignUp { user }).await
    }

    async fn sign_in(&self, mail: &str, password: &str) -> Result<String, ServiceError> {
        let call = AuthCall::SignIn {
            mail: mail.to_string(),
            password: password.to_string(),
        };
        self.call(&self.auth_url, &call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_without_double_slashes() {
        assert_eq!(
            endpoint("http://users:8081/", USER_PATH),
            "http://users:8081/rpc/user"
        );
        assert_eq!(
            endpoint("http://events:8081", EVENT_PATH),
            "http://events:8081/rpc/event"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        // Port 9 (discard) on loopback has no listener in test environments.
        let remote = RemoteServices::new(
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(matches!(
            remote.get_user_by_id("42").await,
            Err(ServiceError::Unavailable(_))
        ));
    }
}
