use std::collections::HashMap;
use std::fmt;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The identity a session authenticates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Path parameters captured by the router for the current request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteVars(HashMap<String, String>);

impl RouteVars {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns the named parameter or an `InvalidInput` error.
    pub fn require(&self, name: &str) -> Result<&str, AppError> {
        self.get(name)
            .ok_or_else(|| AppError::InvalidInput(format!("Missing route parameter `{}`", name)))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Request-scoped values threaded through the middleware chain.
///
/// `route_vars` is written only by route-variable extraction and `user_id`
/// only by session authentication. Everything after them reads.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub user_id: Option<UserId>,
    pub route_vars: RouteVars,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// The authenticated caller. Rejects with `Unauthenticated` when the session
/// middleware did not run or did not resolve an identity.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.user_id.clone())
            .map(CurrentUser)
            .ok_or(AppError::Unauthenticated)
    }
}
