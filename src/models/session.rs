use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::UserId;

/// A server-side session as stored under `session:<id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The ID of the user this session belongs to.
    pub user_id: UserId,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

/// An anti-forgery token as stored under `csrf:<token>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfRecord {
    /// The ID of the user this token is bound to.
    pub user_id: UserId,
    /// The timestamp when the token expires.
    pub expires_at: DateTime<Utc>,
}

fn expiry(ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl SessionRecord {
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        Self {
            user_id,
            created_at: Utc::now(),
            expires_at: expiry(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

impl CsrfRecord {
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        Self {
            user_id,
            expires_at: expiry(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
