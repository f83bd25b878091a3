#[cfg(feature = "otel")]
mod otel;
#[cfg(feature = "otel")]
pub use otel::{init_otel, shutdown_otel};

#[cfg(feature = "mongo")]
pub mod db;
#[cfg(feature = "mongo")]
pub use db::{init_mongo, mongo, mongo_ready};

#[cfg(feature = "redis")]
pub mod redis;
#[cfg(feature = "redis")]
pub use redis::{init_redis, try_redis};

#[cfg(feature = "env")]
mod env;
#[cfg(feature = "env")]
pub use env::{Env, EnvError, env, init_env, set_env, try_env};
