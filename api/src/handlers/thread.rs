use actix_web::{HttpResponse, Responder, delete, get, post, web};
use bson::{doc, oid::ObjectId};
use bulletin_core::db::{DateTime, FindOptions, Thread, ThreadCategory, ThreadPost};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::ErrorResponse,
    models::{ThreadListModel, ThreadModel, Token, authors},
    validation::{escape, non_blank, required_text}
};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/forum")
            .service(list_threads)
            .service(get_thread)
            .service(create_thread)
            .service(add_post)
            .service(delete_thread)
            .service(delete_post)
    );
}

fn parse_category(category: &str) -> Result<ThreadCategory, ErrorResponse> {
    category.parse().map_err(|_| {
        ErrorResponse::bad_request(format!(
            "Invalid category: {category}. Valid categories are: {}",
            ThreadCategory::VALUES.join(", ")
        ))
    })
}

async fn thread_model(thread: Thread) -> Result<ThreadModel, ErrorResponse> {
    let authors = authors(thread.participants()).await?;

    Ok(ThreadModel::new(thread, &authors))
}

#[derive(Deserialize)]
struct ThreadQuery {
    category: Option<String>
}

#[get("")]
async fn list_threads(
    query: web::Query<ThreadQuery>
) -> Result<impl Responder, ErrorResponse> {
    let filter = match query.category.as_deref() {
        None | Some("") | Some("all") => doc! {},
        Some(category) => doc! {"category": parse_category(category)?.as_str()}
    };

    let threads = Thread::find(
        filter,
        FindOptions::builder().sort(doc! {"createdAt": -1}).build()
    )
    .await?;

    let authors = authors(threads.iter().map(|thread| thread.user)).await?;

    Ok(HttpResponse::Ok().json(
        threads
            .into_iter()
            .map(|thread| ThreadListModel::new(thread, &authors))
            .collect::<Vec<_>>()
    ))
}

#[get("/{id}")]
async fn get_thread(
    path: web::Path<String>
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let Some(thread) =
        Thread::find_one_and_update(doc! {"_id": id}, doc! {"$inc": {"views": 1}})
            .await?
    else {
        return Err(ErrorResponse::not_found("Thread not found"));
    };

    Ok(HttpResponse::Ok().json(thread_model(thread).await?))
}

#[derive(Deserialize)]
struct ThreadForm {
    title:    Option<String>,
    content:  Option<String>,
    category: Option<String>
}

/// Builds a thread from the submitted form, escaping its text.
fn new_thread(form: ThreadForm, user: ObjectId) -> Result<Thread, ErrorResponse> {
    let (Some(title), Some(content)) =
        (non_blank(form.title), non_blank(form.content))
    else {
        return Err(ErrorResponse::bad_request("Title and content are required"));
    };

    let category = match form.category.as_deref() {
        None | Some("") => ThreadCategory::default(),
        Some(category) => parse_category(category)?
    };

    let now = DateTime::now();

    Ok(Thread {
        id: ObjectId::new(),
        title: escape(&title),
        content: escape(&content),
        category,
        user,
        posts: Vec::new(),
        views: 0,
        created_at: now,
        updated_at: now
    })
}

#[post("")]
async fn create_thread(
    body: web::Json<ThreadForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let thread = new_thread(body.into_inner(), token.user_id)?;

    thread.insert().await?;

    log::info!("user {} started thread {}", token.user_id, thread.id);

    Ok(HttpResponse::Created().json(thread_model(thread).await?))
}

#[derive(Deserialize)]
struct PostForm {
    content: Option<String>
}

fn new_post(form: PostForm, user: ObjectId) -> Result<ThreadPost, ErrorResponse> {
    let content = required_text(form.content, "Post content is required")?;

    Ok(ThreadPost::new(escape(&content), user))
}

#[post("/{id}/posts")]
async fn add_post(
    path: web::Path<String>,
    body: web::Json<PostForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let post = new_post(body.into_inner(), token.user_id)?;

    let Some(thread) = Thread::find_one_and_update(
        doc! {"_id": id},
        doc! {
            "$push": {"posts": bson::to_bson(&post)?},
            "$set": {"updatedAt": DateTime::now()}
        }
    )
    .await?
    else {
        return Err(ErrorResponse::not_found("Thread not found"));
    };

    Ok(HttpResponse::Created().json(thread_model(thread).await?))
}

#[delete("/{id}")]
async fn delete_thread(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let Some(thread) = Thread::find_one(doc! {"_id": id}).await? else {
        return Err(ErrorResponse::not_found("Thread not found"));
    };

    token.require_owner_or_admin(&thread, "delete", "thread")?;

    Thread::delete_one(doc! {"_id": id}).await?;

    log::info!("user {} deleted thread {id}", token.user_id);

    Ok(HttpResponse::Ok().json(json!({"message": "Thread deleted successfully"})))
}

#[delete("/{id}/posts/{post_id}")]
async fn delete_post(
    path: web::Path<(String, String)>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let (id, post_id) = path.into_inner();

    let id = ObjectId::parse_str(id)?;
    let post_id = ObjectId::parse_str(post_id)?;

    let Some(thread) = Thread::find_one(doc! {"_id": id}).await? else {
        return Err(ErrorResponse::not_found("Thread not found"));
    };

    let Some(post) = thread.post(post_id) else {
        return Err(ErrorResponse::not_found("Post not found"));
    };

    token.require_owner_or_admin(post, "delete", "post")?;

    match Thread::find_one_and_update(
        doc! {"_id": id},
        doc! {
            "$pull": {"posts": {"_id": post_id}},
            "$set": {"updatedAt": DateTime::now()}
        }
    )
    .await?
    {
        Some(thread) => Ok(HttpResponse::Ok().json(thread_model(thread).await?)),
        None => Err(ErrorResponse::not_found("Thread not found"))
    }
}
