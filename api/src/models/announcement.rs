use bulletin_core::db::{Announcement, AnnouncementType, PosterSize, Theme};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementModel {
    #[serde(rename = "_id")]
    pub id:                String,
    pub title:             String,
    #[serde(rename = "type")]
    pub announcement_type: AnnouncementType,
    pub theme:             Option<Theme>,
    pub location:          Option<String>,
    pub date:              Option<DateTime<Utc>>,
    pub group:             Option<String>,
    pub image:             Option<String>,
    pub urgent:            bool,
    pub size:              PosterSize,
    pub created_by:        Option<String>,
    pub created_at:        DateTime<Utc>,
    pub updated_at:        DateTime<Utc>
}

impl From<Announcement> for AnnouncementModel {
    fn from(announcement: Announcement) -> Self {
        Self {
            id:                announcement.id.to_hex(),
            title:             announcement.title,
            announcement_type: announcement.announcement_type,
            theme:             announcement.theme,
            location:          announcement.location,
            date:              announcement.date.map(|date| date.to_chrono()),
            group:             announcement.group,
            image:             announcement.image,
            urgent:            announcement.urgent,
            size:              announcement.size,
            created_by:        announcement.created_by.map(|id| id.to_hex()),
            created_at:        announcement.created_at.to_chrono(),
            updated_at:        announcement.updated_at.to_chrono()
        }
    }
}
