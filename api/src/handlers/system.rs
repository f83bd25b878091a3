use std::time::Instant;

use actix_web::{HttpResponse, Responder, get, web};
use bulletin_core::{env, mongo_ready};
use serde_json::json;

use crate::models::{csrf_cookie, new_csrf_token};

lazy_static::lazy_static! {
    static ref STARTED: Instant = Instant::now();
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(healthcheck).service(health).service(csrf_token);
}

/// Starts the uptime clock reported by `/api/health`.
pub fn start_uptime_clock() {
    lazy_static::initialize(&STARTED);
}

#[get("/healthcheck")]
async fn healthcheck() -> impl Responder {
    HttpResponse::NoContent().finish()
}

#[get("/api/health")]
async fn health() -> impl Responder {
    let connected = mongo_ready().await;

    HttpResponse::Ok().json(json!({
        "uptime": STARTED.elapsed().as_secs_f64(),
        "message": if connected { "OK" } else { "WARNING" },
        "timestamp": chrono::Utc::now().timestamp_millis(),
        "database": if connected { "Connected" } else { "Disconnected" }
    }))
}

#[get("/api/csrf-token")]
async fn csrf_token() -> impl Responder {
    let token = new_csrf_token(&env().jwt_secret);

    HttpResponse::Ok()
        .cookie(csrf_cookie(&token))
        .json(json!({"csrfToken": token}))
}
