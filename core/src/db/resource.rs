use bson::{DateTime, oid::ObjectId};
use mongo_document::Document;
use serde::{Deserialize, Serialize};

use super::{
    Owned,
    enums::{FileType, ResourceCategory}
};

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Document, Serialize, Deserialize)]
#[document(collection = "resources")]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// public path under `/uploads/resources/`
    pub file_url: String,
    /// name of the file as uploaded by the client
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub file_type: FileType,
    #[serde(default)]
    pub category: ResourceCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub user: ObjectId,
    #[serde(default)]
    pub downloads: i64,
    #[serde(default = "default_public")]
    pub is_public: bool,
    pub created_at: DateTime,
    #[serde(default = "DateTime::now")]
    pub updated_at: DateTime
}

impl Owned for Resource {
    fn owner(&self) -> Option<ObjectId> {
        Some(self.user)
    }
}
