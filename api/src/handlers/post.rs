use actix_web::{HttpResponse, Responder, delete, get, patch, post, put, web};
use bson::{doc, oid::ObjectId};
use bulletin_core::db::{DateTime, FindOptions, Post, Topic};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::ErrorResponse,
    models::{PostModel, Token, authors},
    validation::{escape, non_blank, required_text}
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/posts")
            .service(list_posts)
            .service(create_post)
            .service(update_post)
            .service(delete_post)
            .service(toggle_like)
    );
}

async fn post_model(post: Post) -> Result<PostModel, ErrorResponse> {
    let authors = authors([post.user]).await?;

    Ok(PostModel::new(post, &authors))
}

async fn find_post(id: ObjectId) -> Result<Post, ErrorResponse> {
    Post::find_one(doc! {"_id": id})
        .await?
        .ok_or_else(|| ErrorResponse::not_found("Post not found"))
}

#[get("/topic/{topic_id}")]
async fn list_posts(
    path: web::Path<String>
) -> Result<impl Responder, ErrorResponse> {
    let topic = ObjectId::parse_str(path.into_inner())?;

    let posts = Post::find(
        doc! {"topic": topic},
        FindOptions::builder().sort(doc! {"createdAt": 1}).build()
    )
    .await?;

    let authors = authors(posts.iter().map(|post| post.user)).await?;

    Ok(HttpResponse::Ok().json(
        posts
            .into_iter()
            .map(|post| PostModel::new(post, &authors))
            .collect::<Vec<_>>()
    ))
}

#[derive(Deserialize)]
struct PostForm {
    content: Option<String>,
    topic:   Option<String>
}

#[post("")]
async fn create_post(
    body: web::Json<PostForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let body = body.into_inner();

    let (Some(content), Some(topic)) = (non_blank(body.content), non_blank(body.topic))
    else {
        return Err(ErrorResponse::bad_request("Content and topic are required"));
    };

    let topic = ObjectId::parse_str(topic)?;

    let Some(topic) = Topic::find_one(doc! {"_id": topic}).await? else {
        return Err(ErrorResponse::not_found("Topic not found"));
    };

    if topic.is_locked && !token.is_admin() {
        return Err(ErrorResponse::forbidden("Topic is locked"));
    }

    let post = Post::new(escape(&content), topic.id, token.user_id);

    post.insert().await?;

    Topic::update_one(
        doc! {"_id": topic.id},
        doc! {"$set": {"lastActivity": post.created_at}}
    )
    .await?;

    Ok(HttpResponse::Created().json(post_model(post).await?))
}

#[put("/{id}")]
async fn update_post(
    path: web::Path<String>,
    body: web::Json<PostForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let content = required_text(body.into_inner().content, "Content is required")?;

    let post = find_post(id).await?;

    token.require_owner_or_admin(&post, "update", "post")?;

    match Post::find_one_and_update(
        doc! {"_id": id},
        doc! {"$set": {"content": escape(&content), "updatedAt": DateTime::now()}}
    )
    .await?
    {
        Some(post) => Ok(HttpResponse::Ok().json(post_model(post).await?)),
        None => Err(ErrorResponse::not_found("Post not found"))
    }
}

#[delete("/{id}")]
async fn delete_post(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let post = find_post(id).await?;

    token.require_owner_or_admin(&post, "delete", "post")?;

    Post::delete_one(doc! {"_id": id}).await?;

    Ok(HttpResponse::Ok().json(json!({"message": "Post deleted successfully"})))
}

/// Likes the post, or takes the like back when already liked.
#[patch("/{id}/like")]
async fn toggle_like(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let post = find_post(id).await?;

    let update = if post.liked_by(token.user_id) {
        doc! {"$pull": {"likes": token.user_id}}
    } else {
        doc! {"$addToSet": {"likes": token.user_id}}
    };

    match Post::find_one_and_update(doc! {"_id": id}, update).await? {
        Some(post) => Ok(HttpResponse::Ok().json(post_model(post).await?)),
        None => Err(ErrorResponse::not_found("Post not found"))
    }
}
