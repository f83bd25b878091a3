use bson::{DateTime, oid::ObjectId};
use mongo_document::Document;
use serde::{Deserialize, Serialize};

use super::enums::Role;

#[derive(Debug, Clone, Document, Serialize, Deserialize)]
#[document(collection = "users")]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never the plain password
    pub password: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime,
    #[serde(default = "DateTime::now")]
    pub updated_at: DateTime
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = DateTime::now();

        Self {
            id: ObjectId::new(),
            name,
            email,
            password: password_hash,
            avatar: None,
            role: Role::User,
            created_at: now,
            updated_at: now
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
