use bson::{DateTime, oid::ObjectId};
use mongo_document::Document;
use serde::{Deserialize, Serialize};

use super::Owned;

#[derive(Debug, Clone, Document, Serialize, Deserialize)]
#[document(collection = "topics")]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub content: String,
    pub forum: ObjectId,
    pub user: ObjectId,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub views: i64,
    pub last_activity: DateTime,
    pub created_at: DateTime
}

impl Owned for Topic {
    fn owner(&self) -> Option<ObjectId> {
        Some(self.user)
    }
}
