use serde::{Deserialize, Serialize};

/// Represents an event as exchanged with the event service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub text: String,
    /// Filled by geocoding when coordinates resolve.
    pub city: String,
    pub category: String,
    /// How many times the event was opened.
    pub viewed: i32,
    pub img_url: String,
    pub tags: Vec<String>,
    pub date: String,
    /// Coordinates formatted as `(lat, lng)`.
    pub geo: String,
    /// Filled by geocoding when coordinates resolve.
    pub address: String,
    pub author_id: String,
}

/// Search criteria for listing events. Empty criteria match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilter {
    pub title: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub date: Option<String>,
    pub tags: Vec<String>,
}

impl EventFilter {
    /// Whether `event` satisfies every criterion that is set.
    pub fn matches(&self, event: &Event) -> bool {
        let contains = |haystack: &str, needle: &Option<String>| match needle {
            Some(n) if !n.is_empty() => haystack.to_lowercase().contains(&n.to_lowercase()),
            _ => true,
        };
        let equals = |value: &str, wanted: &Option<String>| match wanted {
            Some(w) if !w.is_empty() => value.eq_ignore_ascii_case(w),
            _ => true,
        };

        contains(&event.title, &self.title)
            && equals(&event.category, &self.category)
            && equals(&event.city, &self.city)
            && equals(&event.date, &self.date)
            && self
                .tags
                .iter()
                .filter(|t| !t.is_empty())
                .all(|t| event.tags.iter().any(|et| et.eq_ignore_ascii_case(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concert() -> Event {
        Event {
            title: "Spring Jazz Night".into(),
            category: "music".into(),
            city: "Moscow".into(),
            tags: vec!["jazz".into(), "live".into()],
            ..Default::default()
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(EventFilter::default().matches(&concert()));
    }

    #[test]
    fn filter_combines_criteria() {
        let filter = EventFilter {
            title: Some("jazz".into()),
            category: Some("Music".into()),
            tags: vec!["live".into()],
            ..Default::default()
        };
        assert!(filter.matches(&concert()));

        let filter = EventFilter {
            tags: vec!["rock".into()],
            ..Default::default()
        };
        assert!(!filter.matches(&concert()));
    }
}
