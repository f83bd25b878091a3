use std::collections::HashMap;

use bson::oid::ObjectId;
use bulletin_core::db::{FileType, Resource, ResourceCategory};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AuthorModel;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceModel {
    #[serde(rename = "_id")]
    pub id:          String,
    pub title:       String,
    pub description: String,
    pub file_url:    String,
    pub file_name:   String,
    pub mime_type:   Option<String>,
    pub size:        i64,
    pub file_type:   FileType,
    pub category:    ResourceCategory,
    pub tags:        Vec<String>,
    pub user:        Option<AuthorModel>,
    pub downloads:   i64,
    pub is_public:   bool,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>
}

impl ResourceModel {
    pub fn new(resource: Resource, authors: &HashMap<ObjectId, AuthorModel>) -> Self {
        Self {
            id:          resource.id.to_hex(),
            title:       resource.title,
            description: resource.description,
            file_url:    resource.file_url,
            file_name:   resource.file_name,
            mime_type:   resource.mime_type,
            size:        resource.size,
            file_type:   resource.file_type,
            category:    resource.category,
            tags:        resource.tags,
            user:        authors.get(&resource.user).cloned(),
            downloads:   resource.downloads,
            is_public:   resource.is_public,
            created_at:  resource.created_at.to_chrono(),
            updated_at:  resource.updated_at.to_chrono()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationModel {
    pub total: u64,
    pub page:  u64,
    pub limit: u64,
    pub pages: u64
}

impl PaginationModel {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        Self {
            total,
            page,
            limit,
            pages: total.div_ceil(limit.max(1))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResourceListModel {
    pub resources:  Vec<ResourceModel>,
    pub pagination: PaginationModel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(PaginationModel::new(0, 1, 10).pages, 0);
        assert_eq!(PaginationModel::new(10, 1, 10).pages, 1);
        assert_eq!(PaginationModel::new(11, 2, 10).pages, 2);
        assert_eq!(PaginationModel::new(31, 1, 5).pages, 7);
    }
}
