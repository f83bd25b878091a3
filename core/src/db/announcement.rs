use bson::{DateTime, oid::ObjectId};
use mongo_document::Document;
use serde::{Deserialize, Serialize};

use super::{
    Owned,
    PosterSize,
    enums::{AnnouncementType, Theme}
};

#[derive(Debug, Clone, Document, Serialize, Deserialize)]
#[document(collection = "announcements")]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(rename = "type")]
    pub announcement_type: AnnouncementType,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub size: PosterSize,
    #[serde(default)]
    pub created_by: Option<ObjectId>,
    pub created_at: DateTime,
    #[serde(default = "DateTime::now")]
    pub updated_at: DateTime
}

impl Owned for Announcement {
    fn owner(&self) -> Option<ObjectId> {
        self.created_by
    }
}
