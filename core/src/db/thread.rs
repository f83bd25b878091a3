use bson::{DateTime, oid::ObjectId};
use mongo_document::Document;
use serde::{Deserialize, Serialize};

use super::{Owned, enums::ThreadCategory};

/// A reply stored inside its thread document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPost {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub user: ObjectId,
    pub created_at: DateTime
}

impl ThreadPost {
    pub fn new(content: String, user: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            content,
            user,
            created_at: DateTime::now()
        }
    }
}

#[derive(Debug, Clone, Document, Serialize, Deserialize)]
#[document(collection = "threads")]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: ThreadCategory,
    pub user: ObjectId,
    #[serde(default)]
    pub posts: Vec<ThreadPost>,
    #[serde(default)]
    pub views: i64,
    pub created_at: DateTime,
    #[serde(default = "DateTime::now")]
    pub updated_at: DateTime
}

impl Thread {
    pub fn post(&self, id: ObjectId) -> Option<&ThreadPost> {
        self.posts.iter().find(|post| post.id == id)
    }

    /// Every user referenced by the thread or its replies, deduplicated.
    pub fn participants(&self) -> Vec<ObjectId> {
        let mut users = vec![self.user];

        for post in &self.posts {
            if !users.contains(&post.user) {
                users.push(post.user);
            }
        }

        users
    }
}

impl Owned for Thread {
    fn owner(&self) -> Option<ObjectId> {
        Some(self.user)
    }
}

impl Owned for ThreadPost {
    fn owner(&self) -> Option<ObjectId> {
        Some(self.user)
    }
}
