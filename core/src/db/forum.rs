use bson::{DateTime, oid::ObjectId};
use mongo_document::Document;
use serde::{Deserialize, Serialize};

use super::enums::ForumCategory;

#[derive(Debug, Clone, Document, Serialize, Deserialize)]
#[document(collection = "forums")]
#[serde(rename_all = "camelCase")]
pub struct Forum {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub category: ForumCategory,
    pub created_at: DateTime
}
