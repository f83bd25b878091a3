use bson::oid::ObjectId;
use bulletin_core::{Env, db::Role, set_env};

use crate::models::Claims;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

/// Installs a development configuration shared by every test in the binary.
pub fn test_env() -> &'static Env {
    set_env(
        Env::from_lookup(|name| match name {
            "MONGO_URL" => Some("mongodb://localhost:27017".to_string()),
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            "ENVIRONMENT" => Some("development".to_string()),
            "UPLOAD_DIR" => Some(
                std::env::temp_dir()
                    .join("bulletin-api-tests")
                    .to_string_lossy()
                    .into_owned()
            ),
            _ => None
        })
        .expect("test configuration is valid")
    )
}

/// A signed token for a fresh user with `role`.
pub fn bearer(role: Role) -> (ObjectId, String) {
    test_env();

    let user_id = ObjectId::new();

    let token = Claims::new(user_id, "tester".to_string(), role, 3600)
        .encode(TEST_SECRET)
        .expect("token encodes");

    (user_id, format!("Bearer {token}"))
}
