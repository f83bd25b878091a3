use bson::{DateTime, oid::ObjectId};
use mongo_document::Document;
use serde::{Deserialize, Serialize};

use super::{
    Owned,
    enums::{EventType, Theme}
};

/// Grid span of a poster on the bulletin board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterSize {
    pub width:  i32,
    pub height: i32
}

impl PosterSize {
    pub const MAX_SPAN: i32 = 4;

    pub fn is_valid(&self) -> bool {
        (1..=Self::MAX_SPAN).contains(&self.width) &&
            (1..=Self::MAX_SPAN).contains(&self.height)
    }
}

impl Default for PosterSize {
    fn default() -> Self {
        Self {
            width:  1,
            height: 1
        }
    }
}

#[derive(Debug, Clone, Document, Serialize, Deserialize)]
#[document(collection = "events")]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub location: String,
    pub date: DateTime,
    pub group: String,
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub size: PosterSize,
    #[serde(default)]
    pub image: Option<String>,
    pub user: ObjectId,
    pub created_at: DateTime,
    #[serde(default = "DateTime::now")]
    pub updated_at: DateTime
}

impl Event {
    pub fn is_archived_at(&self, now: DateTime) -> bool {
        self.date.timestamp_millis() < now.timestamp_millis()
    }
}

impl Owned for Event {
    fn owner(&self) -> Option<ObjectId> {
        Some(self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_on(date: DateTime) -> Event {
        Event {
            id: ObjectId::new(),
            title: "Club fair".to_string(),
            location: "Quad".to_string(),
            date,
            group: "ASI".to_string(),
            event_type: EventType::Club,
            theme: Theme::Asi,
            urgent: false,
            size: PosterSize::default(),
            image: None,
            user: ObjectId::new(),
            created_at: DateTime::now(),
            updated_at: DateTime::now()
        }
    }

    #[test]
    fn archived_only_when_in_the_past() {
        let now = DateTime::from_millis(1_700_000_000_000);

        assert!(event_on(DateTime::from_millis(1_699_999_999_999)).is_archived_at(now));
        assert!(!event_on(now).is_archived_at(now));
        assert!(!event_on(DateTime::from_millis(1_700_000_000_001)).is_archived_at(now));
    }

    #[test]
    fn poster_size_bounds() {
        assert!(PosterSize::default().is_valid());
        assert!(PosterSize { width: 4, height: 2 }.is_valid());
        assert!(!PosterSize { width: 0, height: 1 }.is_valid());
        assert!(!PosterSize { width: 1, height: 5 }.is_valid());
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let document = bson::doc! {
            "_id": ObjectId::new(),
            "title": "Talk",
            "location": "Hall",
            "date": DateTime::now(),
            "group": "CS",
            "user": ObjectId::new(),
            "createdAt": DateTime::now()
        };

        let event: Event = bson::from_document(document).unwrap();

        assert_eq!(event.event_type, EventType::Event);
        assert_eq!(event.theme, Theme::Asi);
        assert_eq!(event.size, PosterSize::default());
        assert!(event.image.is_none());
    }
}
