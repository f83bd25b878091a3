use bson::{DateTime, oid::ObjectId};
use mongo_document::Document;
use serde::{Deserialize, Serialize};

use super::Owned;

/// A reply in the forum/topic model, stored in its own collection.
#[derive(Debug, Clone, Document, Serialize, Deserialize)]
#[document(collection = "posts")]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub topic: ObjectId,
    pub user: ObjectId,
    #[serde(default)]
    pub likes: Vec<ObjectId>,
    pub created_at: DateTime,
    #[serde(default = "DateTime::now")]
    pub updated_at: DateTime
}

impl Post {
    pub fn new(content: String, topic: ObjectId, user: ObjectId) -> Self {
        let now = DateTime::now();

        Self {
            id: ObjectId::new(),
            content,
            topic,
            user,
            likes: Vec::new(),
            created_at: now,
            updated_at: now
        }
    }

    pub fn liked_by(&self, user: ObjectId) -> bool {
        self.likes.contains(&user)
    }
}

impl Owned for Post {
    fn owner(&self) -> Option<ObjectId> {
        Some(self.user)
    }
}
