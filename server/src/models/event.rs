use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub organizer: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fully assembled record ready for insertion. The store assigns `id` and
/// both timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub organizer: Option<String>,
    pub image: Option<String>,
}

/// Partial update. `None` leaves the stored value untouched.
///
/// `organizer` is doubly optional: `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub organizer: Option<Option<String>>,
    pub image: Option<String>,
}

impl EventPatch {
    /// Applies the patch in place. Used by stores that hold records in memory.
    pub fn apply_to(self, event: &mut Event) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(location) = self.location {
            event.location = location;
        }
        if let Some(organizer) = self.organizer {
            event.organizer = organizer;
        }
        if let Some(image) = self.image {
            event.image = Some(image);
        }
    }
}

/// Parses the temporal value submitted in the `date` form field.
pub struct EventDate;

impl EventDate {
    const NAIVE_FORMATS: [&'static str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    /// Accepts RFC 3339, a naive date-time (taken as UTC) or a plain date
    /// (midnight UTC).
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }

        for format in Self::NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Event {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Event {
            id: Uuid::new_v4(),
            title: "Launch".to_string(),
            description: "Kickoff".to_string(),
            date: at,
            location: "HQ".to_string(),
            organizer: Some("Ops".to_string()),
            image: Some("https://img/one.png".to_string()),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn parses_plain_date_as_midnight_utc() {
        let parsed = EventDate::parse("2025-01-10").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = EventDate::parse("2025-01-10T20:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 10, 18, 30, 0).unwrap());
    }

    #[test]
    fn parses_datetime_local_input() {
        let parsed = EventDate::parse("2025-01-10T18:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 10, 18, 0, 0).unwrap());

        let spaced = EventDate::parse("2025-01-10 18:00").unwrap();
        assert_eq!(spaced, parsed);
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(EventDate::parse("next tuesday").is_none());
        assert!(EventDate::parse("2025-13-40").is_none());
        assert!(EventDate::parse("").is_none());
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut event = sample();
        let before = event.clone();

        EventPatch {
            location: Some("Annex".to_string()),
            ..Default::default()
        }
        .apply_to(&mut event);

        assert_eq!(event.location, "Annex");
        assert_eq!(event.title, before.title);
        assert_eq!(event.organizer, before.organizer);
        assert_eq!(event.image, before.image);
    }

    #[test]
    fn patch_can_clear_organizer() {
        let mut event = sample();
        EventPatch {
            organizer: Some(None),
            ..Default::default()
        }
        .apply_to(&mut event);
        assert!(event.organizer.is_none());
    }
}
