use std::collections::HashMap;

use bson::oid::ObjectId;
use bulletin_core::db::{Thread, ThreadCategory, ThreadPost};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AuthorModel;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPostModel {
    #[serde(rename = "_id")]
    pub id:         String,
    pub content:    String,
    pub user:       Option<AuthorModel>,
    pub created_at: DateTime<Utc>
}

impl ThreadPostModel {
    pub fn new(post: ThreadPost, authors: &HashMap<ObjectId, AuthorModel>) -> Self {
        Self {
            id:         post.id.to_hex(),
            content:    post.content,
            user:       authors.get(&post.user).cloned(),
            created_at: post.created_at.to_chrono()
        }
    }
}

/// A thread with its replies, as returned by the detail endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadModel {
    #[serde(rename = "_id")]
    pub id:         String,
    pub title:      String,
    pub content:    String,
    pub category:   ThreadCategory,
    pub user:       Option<AuthorModel>,
    pub posts:      Vec<ThreadPostModel>,
    pub views:      i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl ThreadModel {
    pub fn new(thread: Thread, authors: &HashMap<ObjectId, AuthorModel>) -> Self {
        Self {
            id:         thread.id.to_hex(),
            title:      thread.title,
            content:    thread.content,
            category:   thread.category,
            user:       authors.get(&thread.user).cloned(),
            posts:      thread
                .posts
                .into_iter()
                .map(|post| ThreadPostModel::new(post, authors))
                .collect(),
            views:      thread.views,
            created_at: thread.created_at.to_chrono(),
            updated_at: thread.updated_at.to_chrono()
        }
    }
}

/// A thread without its replies, for the listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadListModel {
    #[serde(rename = "_id")]
    pub id:         String,
    pub title:      String,
    pub content:    String,
    pub category:   ThreadCategory,
    pub user:       Option<AuthorModel>,
    pub post_count: usize,
    pub views:      i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl ThreadListModel {
    pub fn new(thread: Thread, authors: &HashMap<ObjectId, AuthorModel>) -> Self {
        Self {
            id:         thread.id.to_hex(),
            title:      thread.title,
            content:    thread.content,
            category:   thread.category,
            user:       authors.get(&thread.user).cloned(),
            post_count: thread.posts.len(),
            views:      thread.views,
            created_at: thread.created_at.to_chrono(),
            updated_at: thread.updated_at.to_chrono()
        }
    }
}

#[cfg(test)]
mod tests {
    use bson::DateTime as BsonDateTime;

    use super::*;

    #[test]
    fn listing_counts_posts_and_resolves_authors() {
        let author = ObjectId::new();
        let replier = ObjectId::new();

        let thread = Thread {
            id: ObjectId::new(),
            title: "Study group".to_string(),
            content: "Anyone?".to_string(),
            category: ThreadCategory::Academic,
            user: author,
            posts: vec![
                ThreadPost::new("me".to_string(), replier),
                ThreadPost::new("me too".to_string(), replier)
            ],
            views: 7,
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now()
        };

        let authors = HashMap::from([(author, AuthorModel {
            id:       author.to_hex(),
            name:     "ada".to_string(),
            username: "ada".to_string(),
            avatar:   None
        })]);

        let listed =
            serde_json::to_value(ThreadListModel::new(thread.clone(), &authors))
                .unwrap();

        assert_eq!(listed["postCount"], 2);
        assert_eq!(listed["user"]["name"], "ada");
        assert!(listed.get("posts").is_none());

        let detail = ThreadModel::new(thread, &authors);

        assert_eq!(detail.posts.len(), 2);
        assert!(detail.posts[0].user.is_none());
    }
}
