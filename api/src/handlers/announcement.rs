use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use bson::{doc, oid::ObjectId};
use bulletin_core::db::{Announcement, DateTime, FindOptions};
use serde_json::json;

use crate::{
    error::ErrorResponse,
    models::{AnnouncementModel, Token},
    validation::AnnouncementForm
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/announcements")
            .service(list_announcements)
            .service(get_announcement)
            .service(create_announcement)
            .service(update_announcement)
            .service(delete_announcement)
    );
}

#[get("")]
async fn list_announcements() -> Result<impl Responder, ErrorResponse> {
    let announcements = Announcement::find(
        doc! {},
        FindOptions::builder().sort(doc! {"createdAt": -1}).build()
    )
    .await?;

    Ok(HttpResponse::Ok().json(
        announcements
            .into_iter()
            .map(AnnouncementModel::from)
            .collect::<Vec<_>>()
    ))
}

#[get("/{id}")]
async fn get_announcement(
    path: web::Path<String>
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    match Announcement::find_one(doc! {"_id": id}).await? {
        Some(announcement) => {
            Ok(HttpResponse::Ok().json(AnnouncementModel::from(announcement)))
        }
        None => Err(ErrorResponse::not_found("Announcement not found"))
    }
}

#[post("")]
async fn create_announcement(
    body: web::Json<AnnouncementForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let mut document = body.into_inner().validate(false)?;

    let now = DateTime::now();

    document.insert("_id", ObjectId::new());
    document.insert("createdBy", token.user_id);
    document.insert("createdAt", now);
    document.insert("updatedAt", now);

    let announcement: Announcement = bson::from_document(document)
        .map_err(|error| ErrorResponse::default().with_internal(error))?;

    announcement.insert().await?;

    log::info!(
        "user {} created announcement {}",
        token.user_id,
        announcement.id
    );

    Ok(HttpResponse::Created().json(AnnouncementModel::from(announcement)))
}

#[put("/{id}")]
async fn update_announcement(
    path: web::Path<String>,
    body: web::Json<AnnouncementForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let mut set = body.into_inner().validate(true)?;

    let Some(announcement) = Announcement::find_one(doc! {"_id": id}).await?
    else {
        return Err(ErrorResponse::not_found("Announcement not found"));
    };

    token.require_owner_or_admin(&announcement, "update", "announcement")?;

    set.insert("updatedAt", DateTime::now());

    match Announcement::find_one_and_update(doc! {"_id": id}, doc! {"$set": set})
        .await?
    {
        Some(announcement) => {
            Ok(HttpResponse::Ok().json(AnnouncementModel::from(announcement)))
        }
        None => Err(ErrorResponse::not_found("Announcement not found"))
    }
}

#[delete("/{id}")]
async fn delete_announcement(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let Some(announcement) = Announcement::find_one(doc! {"_id": id}).await?
    else {
        return Err(ErrorResponse::not_found("Announcement not found"));
    };

    token.require_owner_or_admin(&announcement, "delete", "announcement")?;

    Announcement::delete_one(doc! {"_id": id}).await?;

    Ok(HttpResponse::Ok()
        .json(json!({"message": "Announcement deleted successfully"})))
}
