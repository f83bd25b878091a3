#![forbid(unsafe_code)]

use actix_web::{
    App,
    HttpServer,
    middleware::{Logger, from_fn}
};
use bulletin_core::{
    env,
    init_env,
    init_mongo,
    init_otel,
    init_redis,
    shutdown_otel
};

mod error;
mod handlers;
mod middleware;
mod models;
mod upload;
mod validation;

#[cfg(test)]
mod test_support;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = init_env()?;

    for warning in config.warnings() {
        log::warn!("{warning}");
    }

    init_otel("bulletin-api", env!("CARGO_PKG_VERSION"))?;

    init_mongo(true).await?;

    init_redis().await?;

    handlers::start_uptime_clock();

    for kind in [upload::UploadKind::Poster, upload::UploadKind::Resource] {
        tokio::fs::create_dir_all(config.upload_dir.join(kind.directory())).await?;
    }

    log::info!("listening on {}:{}", config.host, config.port);

    HttpServer::new(|| {
        App::new()
            .wrap(Logger::default())
            .wrap(middleware::security_headers())
            .wrap(middleware::cors_policy())
            .wrap(from_fn(middleware::otel))
            .service(upload::poster_files(&env().upload_dir))
            .configure(handlers::config)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    shutdown_otel()
}
