use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use bson::{doc, oid::ObjectId};
use bulletin_core::db::{DateTime, FindOptions, Forum, ForumCategory, Post, Topic};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::ErrorResponse,
    models::{ForumModel, Token},
    validation::{escape, non_blank}
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/forums")
            .service(list_forums)
            .service(get_forum)
            .service(create_forum)
            .service(update_forum)
            .service(delete_forum)
    );
}

#[derive(Deserialize)]
struct ForumForm {
    name:        Option<String>,
    description: Option<String>,
    category:    Option<String>
}

fn parse_category(category: &str) -> Result<ForumCategory, ErrorResponse> {
    category.parse().map_err(|_| {
        ErrorResponse::bad_request(format!(
            "Invalid category: {category}. Valid categories are: {}",
            ForumCategory::VALUES.join(", ")
        ))
    })
}

#[get("")]
async fn list_forums() -> Result<impl Responder, ErrorResponse> {
    let forums = Forum::find(
        doc! {},
        FindOptions::builder().sort(doc! {"category": 1, "name": 1}).build()
    )
    .await?;

    Ok(HttpResponse::Ok()
        .json(forums.into_iter().map(ForumModel::from).collect::<Vec<_>>()))
}

#[get("/{id}")]
async fn get_forum(
    path: web::Path<String>
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    match Forum::find_one(doc! {"_id": id}).await? {
        Some(forum) => Ok(HttpResponse::Ok().json(ForumModel::from(forum))),
        None => Err(ErrorResponse::not_found("Forum not found"))
    }
}

#[post("")]
async fn create_forum(
    body: web::Json<ForumForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    token.require_admin()?;

    let body = body.into_inner();

    let (Some(name), Some(description)) =
        (non_blank(body.name), non_blank(body.description))
    else {
        return Err(ErrorResponse::bad_request(
            "Forum name and description are required"
        ));
    };

    let category = match body.category.as_deref() {
        None | Some("") => ForumCategory::default(),
        Some(category) => parse_category(category)?
    };

    let forum = Forum {
        id: ObjectId::new(),
        name: escape(&name),
        description: escape(&description),
        category,
        created_at: DateTime::now()
    };

    // a taken name surfaces as a duplicate key error
    forum.insert().await?;

    Ok(HttpResponse::Created().json(ForumModel::from(forum)))
}

#[put("/{id}")]
async fn update_forum(
    path: web::Path<String>,
    body: web::Json<ForumForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    token.require_admin()?;

    let id = ObjectId::parse_str(path.into_inner())?;

    let body = body.into_inner();

    let mut set = doc! {};

    if let Some(name) = non_blank(body.name) {
        set.insert("name", escape(&name));
    }

    if let Some(description) = non_blank(body.description) {
        set.insert("description", escape(&description));
    }

    if let Some(category) = non_blank(body.category) {
        set.insert("category", parse_category(&category)?.as_str());
    }

    let forum = if set.is_empty() {
        Forum::find_one(doc! {"_id": id}).await?
    } else {
        Forum::find_one_and_update(doc! {"_id": id}, doc! {"$set": set}).await?
    };

    match forum {
        Some(forum) => Ok(HttpResponse::Ok().json(ForumModel::from(forum))),
        None => Err(ErrorResponse::not_found("Forum not found"))
    }
}

#[delete("/{id}")]
async fn delete_forum(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    token.require_admin()?;

    let id = ObjectId::parse_str(path.into_inner())?;

    if Forum::find_one(doc! {"_id": id}).await?.is_none() {
        return Err(ErrorResponse::not_found("Forum not found"));
    }

    let topics: Vec<ObjectId> = Topic::find(doc! {"forum": id}, None)
        .await?
        .into_iter()
        .map(|topic| topic.id)
        .collect();

    let posts = Post::delete_many(doc! {"topic": {"$in": topics}}).await?;
    let topics = Topic::delete_many(doc! {"forum": id}).await?;

    Forum::delete_one(doc! {"_id": id}).await?;

    log::info!("deleted forum {id} with {topics} topics and {posts} posts");

    Ok(HttpResponse::Ok().json(json!({"message": "Forum deleted successfully"})))
}
