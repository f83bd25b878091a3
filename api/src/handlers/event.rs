use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use bson::{doc, oid::ObjectId};
use bulletin_core::{
    db::{DateTime, Event, FindOptions},
    env
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::ErrorResponse,
    models::{EventModel, Token},
    upload::{UploadKind, read_multipart, remove_stored, store, validate_file},
    validation::{EventForm, start_of_utc_day}
};

pub fn config(cfg: &mut web::ServiceConfig) {
    // check-limit has to win over /{id}
    cfg.service(
        web::scope("/api/events")
            .service(list_events)
            .service(check_limit)
            .service(get_event)
            .service(create_event)
            .service(update_event)
            .service(delete_event)
    );
}

#[derive(Deserialize)]
struct EventQuery {
    status: Option<String>
}

/// Filter on the archived flag, evaluated against `now`.
fn status_filter(
    status: Option<&str>,
    now: DateTime
) -> Result<bson::Document, ErrorResponse> {
    match status {
        None | Some("") | Some("all") => Ok(doc! {}),
        Some("current") => Ok(doc! {"date": {"$gte": now}}),
        Some("archived") => Ok(doc! {"date": {"$lt": now}}),
        Some(other) => Err(ErrorResponse::bad_request(format!(
            "Invalid status: {other}. Valid statuses are: current, archived"
        )))
    }
}

async fn events_created_today(user: ObjectId) -> Result<u64, ErrorResponse> {
    let since = DateTime::from_chrono(start_of_utc_day(chrono::Utc::now()));

    Ok(Event::count_documents(doc! {
        "user": user,
        "createdAt": {"$gte": since}
    })
    .await?)
}

#[get("")]
async fn list_events(
    query: web::Query<EventQuery>
) -> Result<impl Responder, ErrorResponse> {
    let now = DateTime::now();

    let events = Event::find(
        status_filter(query.status.as_deref(), now)?,
        FindOptions::builder().sort(doc! {"date": 1}).build()
    )
    .await?;

    Ok(HttpResponse::Ok().json(
        events
            .into_iter()
            .map(|event| EventModel::at(event, now))
            .collect::<Vec<_>>()
    ))
}

#[get("/check-limit")]
async fn check_limit(token: Token) -> Result<impl Responder, ErrorResponse> {
    let count = events_created_today(token.user_id).await?;
    let limit = env().daily_event_limit;

    Ok(HttpResponse::Ok().json(json!({
        "count": count,
        "limit": limit,
        "canAddMore": count < limit
    })))
}

#[get("/{id}")]
async fn get_event(
    path: web::Path<String>
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    match Event::find_one(doc! {"_id": id}).await? {
        Some(event) => Ok(HttpResponse::Ok().json(EventModel::from(event))),
        None => Err(ErrorResponse::not_found("Event not found"))
    }
}

#[post("")]
async fn create_event(
    payload: Multipart,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let limit = env().daily_event_limit;

    if events_created_today(token.user_id).await? >= limit {
        return Err(ErrorResponse::new(
            429,
            format!(
                "Daily event limit reached. You can create up to {limit} \
                 events per day."
            )
        ));
    }

    let form = read_multipart(payload, UploadKind::Poster.max_size()).await?;

    let changes = EventForm::from_fields(&form.fields)?.validate(false)?;

    let image = match &form.file {
        Some(file) => {
            validate_file(UploadKind::Poster, file)?;

            Some(store(&env().upload_dir, UploadKind::Poster, file).await?.url)
        }
        None => None
    };

    let event = changes.into_event(token.user_id, image);

    if let Err(error) = event.insert().await {
        if let Some(image) = &event.image {
            remove_stored(&env().upload_dir, image).await;
        }

        return Err(error.into());
    }

    log::info!("user {} created event {}", token.user_id, event.id);

    Ok(HttpResponse::Created().json(EventModel::from(event)))
}

#[put("/{id}")]
async fn update_event(
    path: web::Path<String>,
    body: web::Json<EventForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let changes = body.into_inner().validate(true)?;

    let Some(event) = Event::find_one(doc! {"_id": id}).await? else {
        return Err(ErrorResponse::not_found("Event not found"));
    };

    token.require_owner_or_admin(&event, "update", "event")?;

    match Event::find_one_and_update(
        doc! {"_id": id},
        doc! {"$set": changes.to_set()}
    )
    .await?
    {
        Some(event) => Ok(HttpResponse::Ok().json(EventModel::from(event))),
        None => Err(ErrorResponse::not_found("Event not found"))
    }
}

#[delete("/{id}")]
async fn delete_event(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let Some(event) = Event::find_one(doc! {"_id": id}).await? else {
        return Err(ErrorResponse::not_found("Event not found"));
    };

    token.require_owner_or_admin(&event, "delete", "event")?;

    Event::delete_one(doc! {"_id": id}).await?;

    if let Some(image) = &event.image {
        remove_stored(&env().upload_dir, image).await;
    }

    log::info!("user {} deleted event {id}", token.user_id);

    Ok(HttpResponse::Ok().json(json!({"message": "Event deleted successfully"})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filters() {
        let now = DateTime::from_millis(1_700_000_000_000);

        assert_eq!(status_filter(None, now).unwrap(), doc! {});
        assert_eq!(
            status_filter(Some("current"), now).unwrap(),
            doc! {"date": {"$gte": now}}
        );
        assert_eq!(
            status_filter(Some("archived"), now).unwrap(),
            doc! {"date": {"$lt": now}}
        );
        assert_eq!(status_filter(Some("future"), now).unwrap_err().status, 400);
    }
}
