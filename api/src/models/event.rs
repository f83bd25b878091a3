use bulletin_core::db::{Event, EventType, PosterSize, Theme};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventModel {
    #[serde(rename = "_id")]
    pub id:          String,
    pub title:       String,
    pub location:    String,
    pub date:        DateTime<Utc>,
    pub group:       String,
    #[serde(rename = "type")]
    pub event_type:  EventType,
    pub theme:       Theme,
    pub urgent:      bool,
    pub size:        PosterSize,
    pub image:       Option<String>,
    pub user:        String,
    pub is_archived: bool,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>
}

impl EventModel {
    pub fn at(event: Event, now: bson::DateTime) -> Self {
        Self {
            id:          event.id.to_hex(),
            is_archived: event.is_archived_at(now),
            title:       event.title,
            location:    event.location,
            date:        event.date.to_chrono(),
            group:       event.group,
            event_type:  event.event_type,
            theme:       event.theme,
            urgent:      event.urgent,
            size:        event.size,
            image:       event.image,
            user:        event.user.to_hex(),
            created_at:  event.created_at.to_chrono(),
            updated_at:  event.updated_at.to_chrono()
        }
    }
}

impl From<Event> for EventModel {
    fn from(event: Event) -> Self {
        Self::at(event, bson::DateTime::now())
    }
}

#[cfg(test)]
mod tests {
    use bson::oid::ObjectId;

    use super::*;

    #[test]
    fn archived_flag_and_wire_names() {
        let now = bson::DateTime::from_millis(1_750_000_000_000);

        let event = Event {
            id: ObjectId::new(),
            title: "Finals review".to_string(),
            location: "Library".to_string(),
            date: bson::DateTime::from_millis(1_740_000_000_000),
            group: "Tutoring".to_string(),
            event_type: EventType::Academic,
            theme: Theme::Stem,
            urgent: true,
            size: PosterSize { width: 2, height: 1 },
            image: Some("/uploads/posters/poster-x.png".to_string()),
            user: ObjectId::new(),
            created_at: now,
            updated_at: now
        };

        let json = serde_json::to_value(EventModel::at(event, now)).unwrap();

        assert_eq!(json["isArchived"], true);
        assert_eq!(json["type"], "academic");
        assert_eq!(json["theme"], "stem");
        assert_eq!(json["size"]["width"], 2);
        assert!(json["date"].as_str().unwrap().starts_with("2025-02-"));
    }
}
