use actix_web::{HttpResponse, web};

use crate::error::ErrorResponse;

mod announcement;
mod auth;
mod event;
mod forum;
mod post;
mod resource;
mod system;
mod thread;
mod topic;

pub use system::start_uptime_clock;

async fn not_found() -> Result<HttpResponse, ErrorResponse> {
    Err(ErrorResponse::not_found("Resource not found"))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|error, _| {
        ErrorResponse::bad_request("Invalid request body")
            .with_internal(error)
            .into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|error, _| {
        ErrorResponse::bad_request("Invalid query")
            .with_internal(error)
            .into()
    }))
    .configure(system::config)
    .configure(auth::config)
    .configure(event::config)
    .configure(announcement::config)
    .configure(thread::config)
    .configure(forum::config)
    .configure(topic::config)
    .configure(post::config)
    .configure(resource::config)
    .default_service(web::to(not_found));
}
