use std::collections::HashMap;

use bson::{doc, oid::ObjectId};
use bulletin_core::db::{MongoError, Role, User};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserModel {
    #[serde(rename = "_id")]
    pub id:         String,
    pub username:   String,
    pub email:      String,
    pub role:       Role,
    pub avatar:     Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl From<User> for UserModel {
    fn from(user: User) -> Self {
        Self {
            id:         user.id.to_hex(),
            username:   user.name,
            email:      user.email,
            role:       user.role,
            avatar:     user.avatar,
            created_at: user.created_at.to_chrono(),
            updated_at: user.updated_at.to_chrono()
        }
    }
}

/// Body returned by register, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthModel {
    #[serde(rename = "_id")]
    pub id:       String,
    pub username: String,
    pub email:    String,
    pub role:     Role,
    pub token:    String
}

impl AuthModel {
    pub fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id.to_hex(),
            username: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            token
        }
    }
}

/// The public slice of a user embedded in content it authored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorModel {
    #[serde(rename = "_id")]
    pub id:       String,
    pub name:     String,
    pub username: String,
    pub avatar:   Option<String>
}

impl From<&User> for AuthorModel {
    fn from(user: &User) -> Self {
        Self {
            id:       user.id.to_hex(),
            name:     user.name.clone(),
            username: user.name.clone(),
            avatar:   user.avatar.clone()
        }
    }
}

/// Looks up every distinct author in `ids` with a single query.
pub async fn authors(
    ids: impl IntoIterator<Item = ObjectId>
) -> Result<HashMap<ObjectId, AuthorModel>, MongoError> {
    let mut ids: Vec<ObjectId> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(User::find(doc! {"_id": {"$in": ids}}, None)
        .await?
        .iter()
        .map(|user| (user.id, AuthorModel::from(user)))
        .collect())
}
