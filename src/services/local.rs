//! In-process implementations of the domain services.
//!
//! [`InMemoryDirectory`] keeps users, events, subscriptions and visits in one
//! lock-protected table. The gateway uses it directly in local mode and the
//! `domain-services` process exposes it over RPC in remote mode.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::auth::{AuthService, hash_password, verify_password};
use super::event::EventService;
use super::user::UserService;
use crate::error::ServiceError;
use crate::models::event::{Event, EventFilter};
use crate::models::user::{NewUser, User};

struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Directory {
    last_user_id: u64,
    last_event_id: u64,
    users: BTreeMap<u64, StoredUser>,
    events: BTreeMap<u64, Event>,
    /// (subscribed, subscriber)
    subscriptions: BTreeSet<(u64, u64)>,
    /// (event, user)
    visits: BTreeSet<(u64, u64)>,
}

impl Directory {
    fn user(&self, id: u64) -> Result<&StoredUser, ServiceError> {
        self.users.get(&id).ok_or(ServiceError::NotFound)
    }

    fn event(&self, id: u64) -> Result<&Event, ServiceError> {
        self.events.get(&id).ok_or(ServiceError::NotFound)
    }

    fn users_by_ids(&self, ids: impl Iterator<Item = u64>) -> Vec<User> {
        ids.filter_map(|id| self.users.get(&id).map(|u| u.user.clone()))
            .collect()
    }

    fn events_by_ids(&self, ids: impl Iterator<Item = u64>) -> Vec<Event> {
        ids.filter_map(|id| self.events.get(&id).cloned()).collect()
    }

    /// Checks that `event_id` exists and belongs to `user_id`.
    fn authored(&self, event_id: u64, user_id: u64) -> Result<&Event, ServiceError> {
        let event = self.event(event_id)?;
        if event.author_id != user_id.to_string() {
            return Err(ServiceError::Forbidden);
        }
        Ok(event)
    }
}

fn parse_id(raw: &str) -> Result<u64, ServiceError> {
    if raw.is_empty() {
        return Err(ServiceError::InvalidInput("Empty id".to_string()));
    }
    raw.parse()
        .map_err(|_| ServiceError::InvalidInput(format!("Invalid id `{}`", raw)))
}

fn normalize_tags(tags: &mut [String]) {
    for tag in tags.iter_mut() {
        *tag = tag.trim().to_lowercase();
    }
}

/// The in-memory user, event and auth service.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Directory>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthService for InMemoryDirectory {
    async fn sign_up(&self, new_user: NewUser) -> Result<String, ServiceError> {
        let mail = new_user.mail.trim().to_lowercase();
        if mail.is_empty() || new_user.password.is_empty() {
            return Err(ServiceError::InvalidInput("Mail and password are required".to_string()));
        }

        let password_hash = hash_password(&new_user.password)?;

        let mut dir = self.inner.write().await;
        if dir.users.values().any(|u| u.user.mail == mail) {
            return Err(ServiceError::InvalidInput("Mail is already registered".to_string()));
        }

        dir.last_user_id += 1;
        let id = dir.last_user_id;
        let user = User {
            id: id.to_string(),
            name: new_user.name,
            surname: new_user.surname,
            mail,
            about: new_user.about,
            img_url: String::new(),
        };
        dir.users.insert(id, StoredUser { user, password_hash });

        tracing::info!("✅ User created with ID: {}", id);
        Ok(id.to_string())
    }

    async fn sign_in(&self, mail: &str, password: &str) -> Result<String, ServiceError> {
        let mail = mail.trim().to_lowercase();
        let (id, password_hash) = {
            let dir = self.inner.read().await;
            let stored = dir
                .users
                .values()
                .find(|u| u.user.mail == mail)
                .ok_or(ServiceError::Forbidden)?;
            (stored.user.id.clone(), stored.password_hash.clone())
        };

        if !verify_password(password, &password_hash)? {
            return Err(ServiceError::Forbidden);
        }

        tracing::info!("✅ User authenticated: {}", id);
        Ok(id)
    }
}

#[async_trait]
impl UserService for InMemoryDirectory {
    async fn get_user_by_id(&self, user_id: &str) -> Result<User, ServiceError> {
        let id = parse_id(user_id)?;
        let dir = self.inner.read().await;
        Ok(dir.user(id)?.user.clone())
    }

    async fn update_user_info(&self, update: User) -> Result<(), ServiceError> {
        let id = parse_id(&update.id)?;
        let mut dir = self.inner.write().await;
        let stored = dir.users.get_mut(&id).ok_or(ServiceError::NotFound)?;

        stored.user.name = update.name;
        stored.user.surname = update.surname;
        stored.user.about = update.about;
        if !update.img_url.is_empty() {
            stored.user.img_url = update.img_url;
        }
        Ok(())
    }

    async fn update_user_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let id = parse_id(user_id)?;
        if password.is_empty() {
            return Err(ServiceError::InvalidInput("Empty password".to_string()));
        }
        let password_hash = hash_password(password)?;

        let mut dir = self.inner.write().await;
        let stored = dir.users.get_mut(&id).ok_or(ServiceError::NotFound)?;
        stored.password_hash = password_hash;

        tracing::info!("✅ Password changed for user: {}", id);
        Ok(())
    }

    async fn get_subscribers(&self, user_id: &str) -> Result<Vec<User>, ServiceError> {
        let id = parse_id(user_id)?;
        let dir = self.inner.read().await;
        dir.user(id)?;
        let ids = dir
            .subscriptions
            .iter()
            .filter(|(subscribed, _)| *subscribed == id)
            .map(|(_, subscriber)| *subscriber);
        Ok(dir.users_by_ids(ids))
    }

    async fn get_subscribes(&self, user_id: &str) -> Result<Vec<User>, ServiceError> {
        let id = parse_id(user_id)?;
        let dir = self.inner.read().await;
        dir.user(id)?;
        let ids = dir
            .subscriptions
            .iter()
            .filter(|(_, subscriber)| *subscriber == id)
            .map(|(subscribed, _)| *subscribed);
        Ok(dir.users_by_ids(ids))
    }

    async fn get_visitors(&self, event_id: &str) -> Result<Vec<User>, ServiceError> {
        let id = parse_id(event_id)?;
        let dir = self.inner.read().await;
        dir.event(id)?;
        let ids = dir
            .visits
            .iter()
            .filter(|(event, _)| *event == id)
            .map(|(_, user)| *user);
        Ok(dir.users_by_ids(ids))
    }

    async fn subscribe(
        &self,
        subscribed_id: &str,
        subscriber_id: &str,
    ) -> Result<(), ServiceError> {
        let subscribed = parse_id(subscribed_id)?;
        let subscriber = parse_id(subscriber_id)?;
        if subscribed == subscriber {
            return Err(ServiceError::InvalidInput("Cannot subscribe to yourself".to_string()));
        }

        let mut dir = self.inner.write().await;
        dir.user(subscribed)?;
        dir.user(subscriber)?;
        dir.subscriptions.insert((subscribed, subscriber));
        Ok(())
    }

    async fn unsubscribe(
        &self,
        subscribed_id: &str,
        subscriber_id: &str,
    ) -> Result<(), ServiceError> {
        let subscribed = parse_id(subscribed_id)?;
        let subscriber = parse_id(subscriber_id)?;
        self.inner
            .write()
            .await
            .subscriptions
            .remove(&(subscribed, subscriber));
        Ok(())
    }

    async fn is_subscribed(
        &self,
        subscribed_id: &str,
        subscriber_id: &str,
    ) -> Result<bool, ServiceError> {
        let subscribed = parse_id(subscribed_id)?;
        let subscriber = parse_id(subscriber_id)?;
        Ok(self
            .inner
            .read()
            .await
            .subscriptions
            .contains(&(subscribed, subscriber)))
    }
}

#[async_trait]
impl EventService for InMemoryDirectory {
    async fn create_event(&self, mut event: Event) -> Result<String, ServiceError> {
        let author = parse_id(&event.author_id)?;
        if event.title.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Event title is required".to_string()));
        }
        normalize_tags(&mut event.tags);

        let mut dir = self.inner.write().await;
        dir.user(author)?;
        dir.last_event_id += 1;
        let id = dir.last_event_id;
        event.id = id.to_string();
        event.viewed = 0;
        dir.events.insert(id, event);

        tracing::info!("✅ Event {} created by user {}", id, author);
        Ok(id.to_string())
    }

    async fn update_event(&self, mut event: Event, user_id: &str) -> Result<(), ServiceError> {
        let id = parse_id(&event.id)?;
        let user = parse_id(user_id)?;
        normalize_tags(&mut event.tags);

        let mut dir = self.inner.write().await;
        let current = dir.authored(id, user)?;
        event.author_id = current.author_id.clone();
        event.viewed = current.viewed;
        dir.events.insert(id, event);
        Ok(())
    }

    async fn delete_event(&self, event_id: &str, user_id: &str) -> Result<(), ServiceError> {
        let id = parse_id(event_id)?;
        let user = parse_id(user_id)?;

        let mut dir = self.inner.write().await;
        dir.authored(id, user)?;
        dir.events.remove(&id);
        dir.visits.retain(|(event, _)| *event != id);
        Ok(())
    }

    async fn get_event_by_id(&self, event_id: &str) -> Result<Event, ServiceError> {
        let id = parse_id(event_id)?;
        let mut dir = self.inner.write().await;
        let event = dir.events.get_mut(&id).ok_or(ServiceError::NotFound)?;
        event.viewed += 1;
        Ok(event.clone())
    }

    async fn get_events(&self, filter: EventFilter) -> Result<Vec<Event>, ServiceError> {
        let dir = self.inner.read().await;
        Ok(dir
            .events
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn get_created_events(&self, author_id: &str) -> Result<Vec<Event>, ServiceError> {
        let author = parse_id(author_id)?.to_string();
        let dir = self.inner.read().await;
        Ok(dir
            .events
            .values()
            .filter(|e| e.author_id == author)
            .cloned()
            .collect())
    }

    async fn visit(&self, event_id: &str, user_id: &str) -> Result<(), ServiceError> {
        let event = parse_id(event_id)?;
        let user = parse_id(user_id)?;

        let mut dir = self.inner.write().await;
        dir.event(event)?;
        dir.user(user)?;
        dir.visits.insert((event, user));
        Ok(())
    }

    async fn unvisit(&self, event_id: &str, user_id: &str) -> Result<(), ServiceError> {
        let event = parse_id(event_id)?;
        let user = parse_id(user_id)?;
        self.inner.write().await.visits.remove(&(event, user));
        Ok(())
    }

    async fn is_visited(&self, event_id: &str, user_id: &str) -> Result<bool, ServiceError> {
        let event = parse_id(event_id)?;
        let user = parse_id(user_id)?;
        Ok(self.inner.read().await.visits.contains(&(event, user)))
    }

    async fn get_visited_events(&self, user_id: &str) -> Result<Vec<Event>, ServiceError> {
        let user = parse_id(user_id)?;
        let dir = self.inner.read().await;
        let ids = dir
            .visits
            .iter()
            .filter(|(_, visitor)| *visitor == user)
            .map(|(event, _)| *event);
        Ok(dir.events_by_ids(ids))
    }

    async fn get_cities(&self) -> Result<Vec<String>, ServiceError> {
        let dir = self.inner.read().await;
        let cities: BTreeSet<String> = dir
            .events
            .values()
            .filter(|e| !e.city.is_empty())
            .map(|e| e.city.clone())
            .collect();
        Ok(cities.into_iter().collect())
    }
}
