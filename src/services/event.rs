use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::event::{Event, EventFilter};

/// The event capability: events and who visits them.
#[async_trait]
pub trait EventService: Send + Sync {
    /// Stores a new event authored by `event.author_id`, returning its id.
    async fn create_event(&self, event: Event) -> Result<String, ServiceError>;

    /// Replaces `event.id`; only its author may do so.
    async fn update_event(&self, event: Event, user_id: &str) -> Result<(), ServiceError>;

    /// Removes `event_id`; only its author may do so.
    async fn delete_event(&self, event_id: &str, user_id: &str) -> Result<(), ServiceError>;

    async fn get_event_by_id(&self, event_id: &str) -> Result<Event, ServiceError>;

    async fn get_events(&self, filter: EventFilter) -> Result<Vec<Event>, ServiceError>;

    async fn get_created_events(&self, author_id: &str) -> Result<Vec<Event>, ServiceError>;

    async fn visit(&self, event_id: &str, user_id: &str) -> Result<(), ServiceError>;

    async fn unvisit(&self, event_id: &str, user_id: &str) -> Result<(), ServiceError>;

    async fn is_visited(&self, event_id: &str, user_id: &str) -> Result<bool, ServiceError>;

    async fn get_visited_events(&self, user_id: &str) -> Result<Vec<Event>, ServiceError>;

    /// Every distinct city events take place in.
    async fn get_cities(&self) -> Result<Vec<String>, ServiceError>;
}
