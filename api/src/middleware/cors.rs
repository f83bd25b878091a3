use actix_cors::Cors;
use bulletin_core::env;

use crate::models::{AUTH_TOKEN_HEADER, CSRF_HEADER};

/// Credentialed CORS for the configured front-end origins.
pub fn cors_policy() -> Cors {
    let cors = Cors::default()
        .allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers([
            "Authorization",
            "Content-Type",
            "Accept",
            AUTH_TOKEN_HEADER,
            CSRF_HEADER
        ])
        .supports_credentials()
        .max_age(3600);

    env()
        .cors_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
