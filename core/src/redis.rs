use std::{sync::OnceLock, time::Duration};

pub use fred::{
    clients::Client as RedisClient,
    error::Error as RedisError,
    interfaces::KeysInterface,
    types::Expiration
};
use fred::{
    interfaces::ClientLike,
    types::{
        Builder,
        config::{Config, TcpConfig}
    }
};
use opentelemetry::{
    global,
    trace::{FutureExt, Tracer}
};

use crate::env::env;

static REDIS: OnceLock<RedisClient> = OnceLock::new();

/// Connects to Redis when `REDIS_URL` is configured.
///
/// Redis only backs the token revocation list, so running without it is
/// allowed; [`try_redis`] returns `None` in that case.
pub async fn init_redis() -> Result<(), Box<dyn std::error::Error>> {
    let Some(redis_url) = env().redis_url.as_deref() else {
        return Ok(());
    };

    let tracer = global::tracer("");

    let redis = tracer
        .in_span("initializing redis", |cx| {
            async {
                let redis: RedisClient =
                    Builder::from_config(Config::from_url(redis_url)?)
                        .with_connection_config(|config| {
                            config.connection_timeout = Duration::from_secs(5);

                            config.tcp = TcpConfig {
                                nodelay: Some(true),
                                ..Default::default()
                            }
                        })
                        .build()?;

                redis.init().await?;

                Ok::<RedisClient, RedisError>(redis)
            }
            .with_context(cx)
        })
        .await?;

    REDIS.set(redis).expect("Failed to set Redis client");

    log::info!("redis connected");

    Ok(())
}

pub fn try_redis() -> Option<&'static RedisClient> {
    REDIS.get()
}

pub fn revoked_token_key(jti: &str) -> String {
    format!("revoked_token:{jti}")
}

/// Marks a token id as revoked for `ttl_secs`; a no-op without Redis.
pub async fn revoke_token(jti: &str, ttl_secs: i64) -> Result<(), RedisError> {
    let Some(redis) = try_redis() else {
        return Ok(());
    };

    if ttl_secs <= 0 {
        return Ok(());
    }

    redis
        .set::<(), _, _>(
            revoked_token_key(jti),
            "1",
            Some(Expiration::EX(ttl_secs)),
            None,
            false
        )
        .await
}

pub async fn is_token_revoked(jti: &str) -> Result<bool, RedisError> {
    match try_redis() {
        Some(redis) => redis.exists::<bool, _>(revoked_token_key(jti)).await,
        None => Ok(false)
    }
}
