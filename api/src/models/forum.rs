use std::collections::HashMap;

use bson::oid::ObjectId;
use bulletin_core::db::{Forum, ForumCategory, Post, Topic};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AuthorModel;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumModel {
    #[serde(rename = "_id")]
    pub id:          String,
    pub name:        String,
    pub description: String,
    pub category:    ForumCategory,
    pub created_at:  DateTime<Utc>
}

impl From<Forum> for ForumModel {
    fn from(forum: Forum) -> Self {
        Self {
            id:          forum.id.to_hex(),
            name:        forum.name,
            description: forum.description,
            category:    forum.category,
            created_at:  forum.created_at.to_chrono()
        }
    }
}

/// Name of the forum a topic belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct ForumRefModel {
    #[serde(rename = "_id")]
    pub id:   String,
    pub name: String
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicModel {
    #[serde(rename = "_id")]
    pub id:            String,
    pub title:         String,
    pub content:       String,
    pub forum:         ForumRefModel,
    pub user:          Option<AuthorModel>,
    pub is_pinned:     bool,
    pub is_locked:     bool,
    pub views:         i64,
    pub last_activity: DateTime<Utc>,
    pub created_at:    DateTime<Utc>
}

impl TopicModel {
    /// `forum_name` is empty when the forum has since been removed.
    pub fn new(
        topic: Topic,
        forum_name: String,
        authors: &HashMap<ObjectId, AuthorModel>
    ) -> Self {
        Self {
            id:            topic.id.to_hex(),
            title:         topic.title,
            content:       topic.content,
            forum:         ForumRefModel {
                id:   topic.forum.to_hex(),
                name: forum_name
            },
            user:          authors.get(&topic.user).cloned(),
            is_pinned:     topic.is_pinned,
            is_locked:     topic.is_locked,
            views:         topic.views,
            last_activity: topic.last_activity.to_chrono(),
            created_at:    topic.created_at.to_chrono()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostModel {
    #[serde(rename = "_id")]
    pub id:         String,
    pub content:    String,
    pub topic:      String,
    pub user:       Option<AuthorModel>,
    pub likes:      Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl PostModel {
    pub fn new(post: Post, authors: &HashMap<ObjectId, AuthorModel>) -> Self {
        Self {
            id:         post.id.to_hex(),
            content:    post.content,
            topic:      post.topic.to_hex(),
            user:       authors.get(&post.user).cloned(),
            likes:      post.likes.iter().map(|id| id.to_hex()).collect(),
            created_at: post.created_at.to_chrono(),
            updated_at: post.updated_at.to_chrono()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_likes_serialize_as_hex() {
        let liker = ObjectId::new();

        let mut post = Post::new("hello".to_string(), ObjectId::new(), ObjectId::new());
        post.likes.push(liker);

        let json = serde_json::to_value(PostModel::new(post, &HashMap::new())).unwrap();

        assert_eq!(json["likes"][0], liker.to_hex());
        assert!(json["user"].is_null());
        assert!(json["createdAt"].is_string());
    }
}
