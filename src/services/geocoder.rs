//! Reverse geocoding used to fill in an event's city and address.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;

use crate::error::ServiceError;
use crate::models::event::Event;

/// A resolved place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub address: String,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves coordinates to the nearest known address.
    async fn locate(&self, latitude: &str, longitude: &str) -> Result<Location, ServiceError>;
}

#[derive(Deserialize)]
struct Suggestions {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Deserialize)]
struct Suggestion {
    #[serde(default)]
    value: String,
    #[serde(default)]
    data: SuggestionData,
}

#[derive(Default, Deserialize)]
struct SuggestionData {
    #[serde(default)]
    city: Option<String>,
}

/// A geocoder speaking the suggestions-style `geolocate/address` API.
pub struct HttpGeocoder {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpGeocoder {
    pub fn new(url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            token,
        })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn locate(&self, latitude: &str, longitude: &str) -> Result<Location, ServiceError> {
        // Both values passed `parse_coordinates`, so they need no escaping.
        let url = format!("{}?lat={}&lon={}", self.url, latitude, longitude);

        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("Token {}", token));
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("❌ Geocoder unreachable: {}", e);
            ServiceError::Unavailable("geocoder unreachable".to_string())
        })?;
        if !response.status().is_success() {
            return Err(ServiceError::Unavailable(format!(
                "geocoder answered {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("geocoder reply: {}", e)))?;
        let parsed: Suggestions = sonic_rs::from_slice(&bytes)
            .map_err(|e| ServiceError::Unavailable(format!("geocoder reply: {}", e)))?;

        let first = parsed
            .suggestions
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound)?;

        Ok(Location {
            city: first.data.city.unwrap_or_default(),
            address: first.value,
        })
    }
}

/// Used when no geocoding endpoint is configured.
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn locate(&self, _latitude: &str, _longitude: &str) -> Result<Location, ServiceError> {
        Err(ServiceError::Unavailable("geocoding is not configured".to_string()))
    }
}

/// Splits `"(lat, lng)"` into its two numeric parts.
pub fn parse_coordinates(geo: &str) -> Option<(String, String)> {
    let inner = geo.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (lat, lng) = inner.split_once(',')?;
    let (lat, lng) = (lat.trim(), lng.trim());

    lat.parse::<f64>().ok().filter(|v| v.is_finite())?;
    lng.parse::<f64>().ok().filter(|v| v.is_finite())?;

    Some((lat.to_string(), lng.to_string()))
}

/// Overwrites the event's city and address from its coordinates.
///
/// Never fails: unparsable coordinates, a geocoder error or a timeout leave
/// both fields empty.
pub async fn enrich(geocoder: &dyn Geocoder, event: &mut Event, deadline: Duration) {
    let location = match parse_coordinates(&event.geo) {
        Some((lat, lng)) => {
            match tokio::time::timeout(deadline, geocoder.locate(&lat, &lng)).await {
                Ok(Ok(location)) => location,
                Ok(Err(e)) => {
                    tracing::warn!("⚠️ Geocoding {} failed: {}", event.geo, e);
                    Location::default()
                }
                Err(_) => {
                    tracing::warn!("⚠️ Geocoding {} timed out", event.geo);
                    Location::default()
                }
            }
        }
        None => {
            tracing::debug!("No usable coordinates in {:?}", event.geo);
            Location::default()
        }
    };

    event.city = location.city;
    event.address = location.address;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn locate(&self, lat: &str, lng: &str) -> Result<Location, ServiceError> {
            Ok(Location {
                city: "Moscow".to_string(),
                address: format!("near {} {}", lat, lng),
            })
        }
    }

    #[test]
    fn coordinates_are_parsed() {
        assert_eq!(
            parse_coordinates("(55.75, 37.61)"),
            Some(("55.75".to_string(), "37.61".to_string()))
        );
        assert_eq!(parse_coordinates("55.75, 37.61"), None);
        assert_eq!(parse_coordinates("(north, south)"), None);
        assert_eq!(parse_coordinates(""), None);
    }

    #[test]
    fn suggestions_reply_is_decoded() {
        let json = r#"{"suggestions":[{"value":"Moscow, Red Square","data":{"city":"Moscow"}}]}"#;
        let parsed: Suggestions = sonic_rs::from_str(json).unwrap();
        assert_eq!(parsed.suggestions[0].value, "Moscow, Red Square");
        assert_eq!(parsed.suggestions[0].data.city.as_deref(), Some("Moscow"));

        let empty: Suggestions = sonic_rs::from_str("{}").unwrap();
        assert!(empty.suggestions.is_empty());
    }

    #[tokio::test]
    async fn enrich_fills_city_and_address() {
        let mut event = Event {
            geo: "(55.75, 37.61)".to_string(),
            ..Default::default()
        };
        enrich(&FixedGeocoder, &mut event, Duration::from_secs(1)).await;

        assert_eq!(event.city, "Moscow");
        assert_eq!(event.address, "near 55.75 37.61");
    }

    #[tokio::test]
    async fn enrich_degrades_to_empty_fields() {
        let mut event = Event {
            geo: "(55.75, 37.61)".to_string(),
            city: "stale".to_string(),
            address: "stale".to_string(),
            ..Default::default()
        };
        enrich(&DisabledGeocoder, &mut event, Duration::from_secs(1)).await;

        assert_eq!(event.city, "");
        assert_eq!(event.address, "");
    }
}
