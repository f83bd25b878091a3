use actix_web::{HttpResponse, Responder, delete, get, patch, post, put, web};
use bson::{doc, oid::ObjectId};
use bulletin_core::db::{DateTime, FindOptions, Forum, Post, Topic};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::ErrorResponse,
    models::{TopicModel, Token, authors},
    validation::{escape, non_blank}
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/topics")
            .service(list_topics)
            .service(get_topic)
            .service(create_topic)
            .service(update_topic)
            .service(delete_topic)
            .service(toggle_pin)
            .service(toggle_lock)
    );
}

async fn forum_name(forum: ObjectId) -> Result<String, ErrorResponse> {
    Ok(Forum::find_one(doc! {"_id": forum})
        .await?
        .map(|forum| forum.name)
        .unwrap_or_default())
}

async fn topic_model(topic: Topic) -> Result<TopicModel, ErrorResponse> {
    let name = forum_name(topic.forum).await?;
    let authors = authors([topic.user]).await?;

    Ok(TopicModel::new(topic, name, &authors))
}

async fn find_topic(id: ObjectId) -> Result<Topic, ErrorResponse> {
    Topic::find_one(doc! {"_id": id})
        .await?
        .ok_or_else(|| ErrorResponse::not_found("Topic not found"))
}

#[get("/forum/{forum_id}")]
async fn list_topics(
    path: web::Path<String>
) -> Result<impl Responder, ErrorResponse> {
    let forum = ObjectId::parse_str(path.into_inner())?;

    let Some(forum) = Forum::find_one(doc! {"_id": forum}).await? else {
        return Err(ErrorResponse::not_found("Forum not found"));
    };

    let topics = Topic::find(
        doc! {"forum": forum.id},
        FindOptions::builder()
            .sort(doc! {"isPinned": -1, "lastActivity": -1})
            .build()
    )
    .await?;

    let authors = authors(topics.iter().map(|topic| topic.user)).await?;

    Ok(HttpResponse::Ok().json(
        topics
            .into_iter()
            .map(|topic| TopicModel::new(topic, forum.name.clone(), &authors))
            .collect::<Vec<_>>()
    ))
}

#[get("/{id}")]
async fn get_topic(
    path: web::Path<String>
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let Some(topic) =
        Topic::find_one_and_update(doc! {"_id": id}, doc! {"$inc": {"views": 1}})
            .await?
    else {
        return Err(ErrorResponse::not_found("Topic not found"));
    };

    Ok(HttpResponse::Ok().json(topic_model(topic).await?))
}

#[derive(Deserialize)]
struct TopicForm {
    title:   Option<String>,
    content: Option<String>,
    forum:   Option<String>
}

#[post("")]
async fn create_topic(
    body: web::Json<TopicForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let body = body.into_inner();

    let (Some(title), Some(content), Some(forum)) = (
        non_blank(body.title),
        non_blank(body.content),
        non_blank(body.forum)
    ) else {
        return Err(ErrorResponse::bad_request(
            "Title, content and forum are required"
        ));
    };

    let forum = ObjectId::parse_str(forum)?;

    let Some(forum) = Forum::find_one(doc! {"_id": forum}).await? else {
        return Err(ErrorResponse::not_found("Forum not found"));
    };

    let now = DateTime::now();
    let content = escape(&content);

    let topic = Topic {
        id: ObjectId::new(),
        title: escape(&title),
        content: content.clone(),
        forum: forum.id,
        user: token.user_id,
        is_pinned: false,
        is_locked: false,
        views: 0,
        last_activity: now,
        created_at: now
    };

    topic.insert().await?;

    // the opening message doubles as the first post of the topic
    Post::new(content, topic.id, token.user_id).insert().await?;

    log::info!(
        "user {} opened topic {} in forum {}",
        token.user_id,
        topic.id,
        forum.id
    );

    let authors = authors([token.user_id]).await?;

    Ok(HttpResponse::Created().json(TopicModel::new(topic, forum.name, &authors)))
}

#[put("/{id}")]
async fn update_topic(
    path: web::Path<String>,
    body: web::Json<TopicForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let body = body.into_inner();

    let topic = find_topic(id).await?;

    token.require_owner_or_admin(&topic, "update", "topic")?;

    let mut set = doc! {};

    if let Some(title) = non_blank(body.title) {
        set.insert("title", escape(&title));
    }

    if let Some(content) = non_blank(body.content) {
        set.insert("content", escape(&content));
    }

    if set.is_empty() {
        return Ok(HttpResponse::Ok().json(topic_model(topic).await?));
    }

    match Topic::find_one_and_update(doc! {"_id": id}, doc! {"$set": set}).await? {
        Some(topic) => Ok(HttpResponse::Ok().json(topic_model(topic).await?)),
        None => Err(ErrorResponse::not_found("Topic not found"))
    }
}

#[delete("/{id}")]
async fn delete_topic(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let topic = find_topic(id).await?;

    token.require_owner_or_admin(&topic, "delete", "topic")?;

    let posts = Post::delete_many(doc! {"topic": id}).await?;

    Topic::delete_one(doc! {"_id": id}).await?;

    log::info!("user {} deleted topic {id} and {posts} posts", token.user_id);

    Ok(HttpResponse::Ok().json(json!({"message": "Topic deleted successfully"})))
}

/// Flips a boolean flag on a topic, admin only.
async fn toggle(
    path: web::Path<String>,
    token: Token,
    field: &str
) -> Result<TopicModel, ErrorResponse> {
    token.require_admin()?;

    let id = ObjectId::parse_str(path.into_inner())?;

    // aggregation pipeline update, so the flip happens server side
    let Some(topic) = Topic::find_one_and_update(
        doc! {"_id": id},
        vec![doc! {"$set": {field: {"$not": [format!("${field}")]}}}]
    )
    .await?
    else {
        return Err(ErrorResponse::not_found("Topic not found"));
    };

    topic_model(topic).await
}

#[patch("/{id}/pin")]
async fn toggle_pin(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    Ok(HttpResponse::Ok().json(toggle(path, token, "isPinned").await?))
}

#[patch("/{id}/lock")]
async fn toggle_lock(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    Ok(HttpResponse::Ok().json(toggle(path, token, "isLocked").await?))
}
