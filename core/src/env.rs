use std::{env::var, path::PathBuf, sync::OnceLock};

use derive_more::{Display, Error};


static ENV: OnceLock<Env> = OnceLock::new();

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Display, Error)]
pub enum EnvError {
    #[display("{_0} is not set")]
    Missing(#[error(not(source))] &'static str),
    #[display("{name} is not a valid value: {value}")]
    Invalid {
        name:  &'static str,
        value: String
    },
    #[display("environment already initialized")]
    AlreadyInitialized
}

#[derive(Debug, Clone)]
pub struct Env {
    pub mongo_url: String,
    pub mongo_database: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub refresh_grace_secs: i64,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_poster_size: u64,
    pub max_resource_size: u64,
    pub daily_event_limit: u64,
    pub cors_origins: Vec<String>,
    pub dev: bool,
    pub otel_enabled: bool
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T
) -> Result<T, EnvError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| EnvError::Invalid { name, value }),
        None => Ok(default)
    }
}

impl Env {
    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>
    ) -> Result<Self, EnvError> {
        let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let dev = match lookup("ENVIRONMENT") {
            Some(environment) => environment != "production",
            None => cfg!(debug_assertions)
        };

        let mut cors_origins = Vec::new();

        // the local front end only talks to development servers
        if dev {
            cors_origins.push("http://localhost:3000".to_string());
        }

        cors_origins.extend(
            lookup("CORS_ORIGIN")
                .unwrap_or_default()
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
        );

        Ok(Self {
            mongo_url: lookup("MONGO_URL")
                .or_else(|| lookup("MONGODB_URI"))
                .ok_or(EnvError::Missing("MONGO_URL"))?,
            mongo_database: lookup("MONGO_DATABASE")
                .unwrap_or("bulletin".to_string()),
            redis_url: lookup("REDIS_URL"),
            jwt_secret: lookup("JWT_SECRET")
                .ok_or(EnvError::Missing("JWT_SECRET"))?,
            token_ttl_secs: parsed(&lookup, "TOKEN_TTL_SECS", 86_400)?,
            refresh_grace_secs: parsed(
                &lookup,
                "REFRESH_GRACE_SECS",
                604_800
            )?,
            host: lookup("HOST").unwrap_or("0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 5000)?,
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(PathBuf::from("./uploads")),
            max_poster_size: parsed(&lookup, "MAX_POSTER_SIZE", 5 * MIB)?,
            max_resource_size: parsed(
                &lookup,
                "MAX_RESOURCE_SIZE",
                25 * MIB
            )?,
            daily_event_limit: parsed(&lookup, "DAILY_EVENT_LIMIT", 3)?,
            cors_origins,
            dev,
            otel_enabled: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").is_some()
        })
    }

    pub fn new() -> Result<Self, EnvError> {
        Self::from_lookup(|name| var(name).ok())
    }

    /// Non-fatal configuration problems worth reporting at startup.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.dev && self.jwt_secret.len() < 32 {
            warnings.push(
                "JWT_SECRET is too short for production use; it should be \
                 at least 32 characters long"
                    .to_string()
            );
        }

        if self.redis_url.is_none() {
            warnings.push(
                "REDIS_URL is not set; logged out tokens stay valid until \
                 they expire"
                    .to_string()
            );
        }

        warnings
    }
}

/// Reads the process environment and installs it globally.
pub fn init_env() -> Result<&'static Env, EnvError> {
    let env = Env::new()?;

    ENV.set(env).map_err(|_| EnvError::AlreadyInitialized)?;

    Ok(self::env())
}

/// Installs `env` unless a configuration is already present, returning
/// whichever one ends up installed.
pub fn set_env(env: Env) -> &'static Env {
    ENV.get_or_init(|| env)
}

pub fn try_env() -> Option<&'static Env> {
    ENV.get()
}

pub fn env() -> &'static Env {
    ENV.get().expect("Env not initialized")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        pairs: &[(&str, &str)]
    ) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let env = Env::from_lookup(lookup(&[
            ("MONGO_URL", "mongodb://localhost"),
            ("JWT_SECRET", "secret")
        ]))
        .unwrap();

        assert_eq!(env.mongo_database, "bulletin");
        assert_eq!(env.port, 5000);
        assert_eq!(env.token_ttl_secs, 86_400);
        assert_eq!(env.max_poster_size, 5 * MIB);
        assert_eq!(env.max_resource_size, 25 * MIB);
        assert_eq!(env.daily_event_limit, 3);
        assert!(env.redis_url.is_none());
        assert!(!env.otel_enabled);
    }

    #[test]
    fn mongodb_uri_is_accepted() {
        let env = Env::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://db"),
            ("JWT_SECRET", "secret")
        ]))
        .unwrap();

        assert_eq!(env.mongo_url, "mongodb://db");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result =
            Env::from_lookup(lookup(&[("MONGO_URL", "mongodb://localhost")]));

        assert!(matches!(result, Err(EnvError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn invalid_number_is_an_error() {
        let result = Env::from_lookup(lookup(&[
            ("MONGO_URL", "mongodb://localhost"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty")
        ]));

        assert!(matches!(result, Err(EnvError::Invalid { name: "PORT", .. })));
    }

    #[test]
    fn cors_origins_are_split() {
        let env = Env::from_lookup(lookup(&[
            ("MONGO_URL", "mongodb://localhost"),
            ("JWT_SECRET", "secret"),
            ("ENVIRONMENT", "development"),
            ("CORS_ORIGIN", "https://a.example, https://b.example")
        ]))
        .unwrap();

        assert_eq!(env.cors_origins, vec![
            "http://localhost:3000",
            "https://a.example",
            "https://b.example"
        ]);
    }

    #[test]
    fn production_does_not_allow_localhost() {
        let env = Env::from_lookup(lookup(&[
            ("MONGO_URL", "mongodb://localhost"),
            ("JWT_SECRET", "secret"),
            ("ENVIRONMENT", "production"),
            ("CORS_ORIGIN", "https://board.example")
        ]))
        .unwrap();

        assert_eq!(env.cors_origins, vec!["https://board.example"]);
    }

    #[test]
    fn production_warns_about_short_secret() {
        let env = Env::from_lookup(lookup(&[
            ("MONGO_URL", "mongodb://localhost"),
            ("JWT_SECRET", "short"),
            ("ENVIRONMENT", "production"),
            ("REDIS_URL", "redis://localhost")
        ]))
        .unwrap();

        assert!(!env.dev);
        assert_eq!(env.warnings().len(), 1);
    }
}
