use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::user::User;

/// The user capability: profiles and subscription relationships.
///
/// Implemented in-process by [`crate::services::local::InMemoryDirectory`] and
/// over the network by [`crate::services::remote::RemoteServices`].
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user_by_id(&self, user_id: &str) -> Result<User, ServiceError>;

    /// Replaces name, surname, about and (when non-empty) the avatar of `user.id`.
    async fn update_user_info(&self, user: User) -> Result<(), ServiceError>;

    async fn update_user_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<(), ServiceError>;

    /// Users subscribed to `user_id`.
    async fn get_subscribers(&self, user_id: &str) -> Result<Vec<User>, ServiceError>;

    /// Users `user_id` is subscribed to.
    async fn get_subscribes(&self, user_id: &str) -> Result<Vec<User>, ServiceError>;

    async fn get_visitors(&self, event_id: &str) -> Result<Vec<User>, ServiceError>;

    async fn subscribe(
        &self,
        subscribed_id: &str,
        subscriber_id: &str,
    ) -> Result<(), ServiceError>;

    async fn unsubscribe(
        &self,
        subscribed_id: &str,
        subscriber_id: &str,
    ) -> Result<(), ServiceError>;

    async fn is_subscribed(
        &self,
        subscribed_id: &str,
        subscriber_id: &str,
    ) -> Result<bool, ServiceError>;
}
