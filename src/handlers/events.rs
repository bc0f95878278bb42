use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    context::{CurrentUser, RequestContext},
    error::{AppError, Result},
    models::event::{Event, EventFilter},
    response::Envelope,
    services::geocoder,
    state::AppState,
    validation::input::{ValidJson, validate_id},
};

/// The request payload for creating or editing an event.
#[derive(Deserialize, Validate)]
pub struct EventRequest {
    #[garde(length(min = 1, max = 256))]
    pub title: String,
    #[serde(default)]
    #[garde(length(max = 1024))]
    pub description: String,
    #[serde(default)]
    #[garde(length(max = 16384))]
    pub text: String,
    #[serde(default)]
    #[garde(length(max = 64))]
    pub category: String,
    #[serde(default)]
    #[garde(length(max = 2048))]
    pub img_url: String,
    #[serde(default)]
    #[garde(length(max = 32), inner(length(max = 64)))]
    pub tags: Vec<String>,
    #[serde(default)]
    #[garde(length(max = 64))]
    pub date: String,
    /// Coordinates as `(lat, lng)`.
    #[serde(default)]
    #[garde(length(max = 64))]
    pub geo: String,
}

impl EventRequest {
    fn into_event(self, id: String, author_id: String) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            text: self.text,
            category: self.category,
            img_url: self.img_url,
            tags: self.tags,
            date: self.date,
            geo: self.geo,
            author_id,
            ..Default::default()
        }
    }
}

/// Query parameters of `GET /events`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventsQuery {
    /// Matched against titles.
    pub query: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub date: Option<String>,
    /// Comma-separated.
    pub tags: Option<String>,
    /// Lists only the events created by this user.
    #[serde(rename = "authorid")]
    pub author_id: Option<String>,
}

impl EventsQuery {
    fn filter(self) -> EventFilter {
        let tags = self
            .tags
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        EventFilter {
            title: self.query,
            category: self.category,
            city: self.city,
            date: self.date,
            tags,
        }
    }
}

#[derive(Serialize)]
pub struct CreatedEvent {
    pub id: String,
}

#[derive(Serialize)]
pub struct Visit {
    pub visited: bool,
}

fn path_id(ctx: &RequestContext) -> Result<&str> {
    let id = ctx.route_vars.require("id")?;
    validate_id(id)?;
    Ok(id)
}

#[axum::debug_handler]
pub async fn list_events(
    State(state): State<AppState>,
    query: std::result::Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    let events = match query.author_id.as_deref().filter(|id| !id.is_empty()) {
        Some(author_id) => {
            validate_id(author_id)?;
            state.call(state.events.get_created_events(author_id)).await?
        }
        None => state.call(state.events.get_events(query.filter())).await?,
    };
    Ok(Envelope::ok(events).into_response())
}

#[axum::debug_handler]
pub async fn get_cities(State(state): State<AppState>) -> Result<Response> {
    let cities = state.call(state.events.get_cities()).await?;
    Ok(Envelope::ok(cities).into_response())
}

#[axum::debug_handler]
pub async fn get_event(State(state): State<AppState>, ctx: RequestContext) -> Result<Response> {
    let id = path_id(&ctx)?;
    let event = state.call(state.events.get_event_by_id(id)).await?;
    Ok(Envelope::ok(event).into_response())
}

/// Events created by the user in the path.
#[axum::debug_handler]
pub async fn get_created_events(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    let events = state.call(state.events.get_created_events(id)).await?;
    Ok(Envelope::ok(events).into_response())
}

/// Events the user in the path marked as visited.
#[axum::debug_handler]
pub async fn get_visited_events(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    let events = state.call(state.events.get_visited_events(id)).await?;
    Ok(Envelope::ok(events).into_response())
}

/// Creates an event authored by the caller.
///
/// City and address come from geocoding `geo`, never from the client.
#[axum::debug_handler]
pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidJson(payload): ValidJson<EventRequest>,
) -> Result<Response> {
    let mut event = payload.into_event(String::new(), user_id.to_string());
    geocoder::enrich(
        state.geocoder.as_ref(),
        &mut event,
        state.config.request_deadline,
    )
    .await;

    let id = state.call(state.events.create_event(event)).await?;
    tracing::info!("✅ Event {} created by user: {}", id, user_id);

    Ok((StatusCode::CREATED, Envelope::ok(CreatedEvent { id })).into_response())
}

/// Replaces an event. Only its author may do so.
#[axum::debug_handler]
pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ctx: RequestContext,
    ValidJson(payload): ValidJson<EventRequest>,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    let mut event = payload.into_event(id.to_string(), user_id.to_string());
    geocoder::enrich(
        state.geocoder.as_ref(),
        &mut event,
        state.config.request_deadline,
    )
    .await;

    state
        .call(state.events.update_event(event, user_id.as_str()))
        .await?;
    tracing::info!("✅ Event {} updated by user: {}", id, user_id);

    Ok(Envelope::ok("Event updated").into_response())
}

#[axum::debug_handler]
pub async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    state
        .call(state.events.delete_event(id, user_id.as_str()))
        .await?;
    tracing::info!("🗑️ Event {} deleted by user: {}", id, user_id);

    Ok(Envelope::ok("Event deleted").into_response())
}

/// Whether the caller marked the event in the path as visited.
#[axum::debug_handler]
pub async fn is_visited(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    let visited = state
        .call(state.events.is_visited(id, user_id.as_str()))
        .await?;
    Ok(Envelope::ok(Visit { visited }).into_response())
}

#[axum::debug_handler]
pub async fn visit(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    state.call(state.events.visit(id, user_id.as_str())).await?;
    Ok(Envelope::ok(Visit { visited: true }).into_response())
}

#[axum::debug_handler]
pub async fn unvisit(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ctx: RequestContext,
) -> Result<Response> {
    let id = path_id(&ctx)?;
    state.call(state.events.unvisit(id, user_id.as_str())).await?;
    Ok(Envelope::ok(Visit { visited: false }).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_becomes_filter() {
        let query = EventsQuery {
            query: Some("rust".to_string()),
            tags: Some("meetup, ,talks".to_string()),
            ..Default::default()
        };
        let filter = query.filter();

        assert_eq!(filter.title.as_deref(), Some("rust"));
        assert_eq!(filter.tags, vec!["meetup".to_string(), "talks".to_string()]);
        assert_eq!(filter.city, None);
    }

    #[test]
    fn client_cannot_choose_location_fields() {
        let request: EventRequest = sonic_rs::from_str(
            r#"{"title":"Meetup","city":"Nowhere","address":"Fake st","geo":"(1, 2)"}"#,
        )
        .unwrap();
        let event = request.into_event("7".to_string(), "42".to_string());

        assert_eq!(event.city, "");
        assert_eq!(event.address, "");
        assert_eq!(event.author_id, "42");
        assert_eq!(event.geo, "(1, 2)");
    }
}
