use std::pin::Pin;

use actix_web::{
    FromRequest,
    HttpRequest,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    http::{Method, header::AUTHORIZATION}
};
use bson::oid::ObjectId;
use bulletin_core::{
    db::{Owned, Role},
    env,
    redis::is_token_revoked
};
use jsonwebtoken::{
    Algorithm,
    DecodingKey,
    EncodingKey,
    Header,
    Validation,
    decode,
    encode
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ErrorResponse;

pub const TOKEN_COOKIE: &str = "token";
pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// user id as hex
    pub sub:  String,
    pub name: String,
    pub role: Role,
    pub jti:  String,
    pub iat:  i64,
    pub exp:  i64
}

impl Claims {
    pub fn new(user_id: ObjectId, name: String, role: Role, ttl_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp();

        Self {
            sub: user_id.to_hex(),
            name,
            role,
            jti: ObjectId::new().to_hex(),
            iat: now,
            exp: now + ttl_secs
        }
    }

    pub fn encode(&self, secret: &str) -> Result<String, ErrorResponse> {
        encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret.as_bytes())
        )
        .map_err(|error| ErrorResponse::default().with_internal(error))
    }

    pub fn decode(token: &str, secret: &str) -> Result<Self, ErrorResponse> {
        Ok(decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256)
        )?
        .claims)
    }

    /// Decodes a token whose expiry may have passed, as long as it passed
    /// no more than `grace_secs` ago.
    pub fn decode_for_refresh(
        token: &str,
        secret: &str,
        grace_secs: i64
    ) -> Result<Self, ErrorResponse> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation
        )?
        .claims;

        if claims.exp + grace_secs < chrono::Utc::now().timestamp() {
            return Err(ErrorResponse::unauthorized(
                "Token expired beyond refresh window"
            ));
        }

        Ok(claims)
    }

    pub fn user_id(&self) -> Result<ObjectId, ErrorResponse> {
        ObjectId::parse_str(&self.sub)
            .map_err(|_| ErrorResponse::unauthorized("Token is not valid"))
    }

    pub fn remaining_secs(&self) -> i64 {
        self.exp - chrono::Utc::now().timestamp()
    }
}

/// Where the request carried its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Bearer,
    Header,
    Cookie
}

/// Finds the token on a request, checking `Authorization: Bearer`, then
/// `x-auth-token`, then the `token` cookie.
pub fn token_from_request(request: &HttpRequest) -> Option<(String, TokenSource)> {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(token) = header(AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        return Some((token.to_string(), TokenSource::Bearer));
    }

    if let Some(token) = header(AUTH_TOKEN_HEADER) {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);

        return Some((token.to_string(), TokenSource::Header));
    }

    request
        .cookie(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .map(|token| (token, TokenSource::Cookie))
}

/// Cookie-authenticated mutating requests must echo the CSRF cookie back in
/// the `x-csrf-token` header.
pub fn csrf_satisfied(request: &HttpRequest, source: TokenSource) -> bool {
    if source != TokenSource::Cookie ||
        matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS)
    {
        return true;
    }

    let Some(cookie) = request.cookie(CSRF_COOKIE) else {
        return false;
    };

    request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|header| !header.is_empty() && header == cookie.value())
}

pub fn new_csrf_token(secret: &str) -> String {
    let mut hasher = Sha256::new();

    hasher.update(secret.as_bytes());
    hasher.update(ObjectId::new().bytes());
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_le_bytes()
    );

    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct Token {
    pub claims:  Claims,
    pub user_id: ObjectId,
    pub source:  TokenSource,
    pub raw:     String
}

impl Token {
    pub async fn verify(raw: String, source: TokenSource) -> Result<Self, ErrorResponse> {
        let claims = Claims::decode(&raw, &env().jwt_secret)
            .map_err(|error| ErrorResponse {
                detail: "Token is not valid".to_string(),
                ..error
            })?;

        if is_token_revoked(&claims.jti).await? {
            return Err(ErrorResponse::unauthorized("Token has been revoked"));
        }

        let user_id = claims.user_id()?;

        Ok(Self {
            claims,
            user_id,
            source,
            raw
        })
    }

    pub fn is_admin(&self) -> bool {
        self.claims.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ErrorResponse> {
        if self.is_admin() {
            return Ok(());
        }

        Err(ErrorResponse::forbidden(
            "Access denied. Admin privileges required."
        ))
    }

    pub fn owns(&self, record: &impl Owned) -> bool {
        record.owner() == Some(self.user_id)
    }

    pub fn require_owner_or_admin(
        &self,
        record: &impl Owned,
        action: &str,
        thing: &str
    ) -> Result<(), ErrorResponse> {
        if self.is_admin() || self.owns(record) {
            return Ok(());
        }

        Err(ErrorResponse::forbidden(format!(
            "Not authorized to {action} this {thing}"
        )))
    }
}

impl FromRequest for Token {
    type Error = ErrorResponse;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(
        request: &HttpRequest,
        _payload: &mut actix_web::dev::Payload
    ) -> Self::Future {
        let Some((token, source)) = token_from_request(request) else {
            return Box::pin(async {
                Err(ErrorResponse::unauthorized(
                    "No token, authorization denied"
                ))
            });
        };

        if !csrf_satisfied(request, source) {
            return Box::pin(async {
                Err(ErrorResponse::forbidden("Invalid CSRF token"))
            });
        }

        Box::pin(Token::verify(token, source))
    }
}

pub fn token_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(!env().dev)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(env().token_ttl_secs))
        .finish()
}

pub fn removed_token_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(!env().dev)
        .same_site(SameSite::Strict)
        .finish();

    cookie.make_removal();

    cookie
}

/// Readable by the front end so it can echo the value in `x-csrf-token`.
pub fn csrf_cookie(value: &str) -> Cookie<'static> {
    Cookie::build(CSRF_COOKIE, value.to_string())
        .path("/")
        .http_only(false)
        .secure(!env().dev)
        .same_site(SameSite::Strict)
        .finish()
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;
    use crate::test_support::{TEST_SECRET, test_env};

    fn token_for(role: Role) -> (ObjectId, String) {
        let user_id = ObjectId::new();

        let token = Claims::new(user_id, "tester".to_string(), role, 3600)
            .encode(TEST_SECRET)
            .unwrap();

        (user_id, token)
    }

    struct Record(Option<ObjectId>);

    impl Owned for Record {
        fn owner(&self) -> Option<ObjectId> {
            self.0
        }
    }

    #[test]
    fn claims_round_trip_and_reject_wrong_secret() {
        let claims = Claims::new(ObjectId::new(), "ada".to_string(), Role::Admin, 60);
        let token = claims.encode(TEST_SECRET).unwrap();

        assert_eq!(Claims::decode(&token, TEST_SECRET).unwrap(), claims);

        let error = Claims::decode(&token, "another-secret").unwrap_err();

        assert_eq!(error.status, 401);
    }

    #[test]
    fn expired_token_refreshes_only_within_grace() {
        let mut claims = Claims::new(ObjectId::new(), "ada".to_string(), Role::User, 0);
        claims.exp -= 3600;

        let token = claims.encode(TEST_SECRET).unwrap();

        assert!(Claims::decode(&token, TEST_SECRET).is_err());
        assert!(Claims::decode_for_refresh(&token, TEST_SECRET, 7200).is_ok());
        assert_eq!(
            Claims::decode_for_refresh(&token, TEST_SECRET, 60)
                .unwrap_err()
                .status,
            401
        );
    }

    #[test]
    fn token_sources_in_priority_order() {
        let request = TestRequest::default()
            .insert_header(("Authorization", "Bearer from-bearer"))
            .insert_header((AUTH_TOKEN_HEADER, "from-header"))
            .cookie(Cookie::new(TOKEN_COOKIE, "from-cookie"))
            .to_http_request();

        assert_eq!(
            token_from_request(&request),
            Some(("from-bearer".to_string(), TokenSource::Bearer))
        );

        let request = TestRequest::default()
            .insert_header((AUTH_TOKEN_HEADER, "Bearer from-header"))
            .to_http_request();

        assert_eq!(
            token_from_request(&request),
            Some(("from-header".to_string(), TokenSource::Header))
        );

        let request = TestRequest::default()
            .cookie(Cookie::new(TOKEN_COOKIE, "from-cookie"))
            .to_http_request();

        assert_eq!(
            token_from_request(&request),
            Some(("from-cookie".to_string(), TokenSource::Cookie))
        );

        assert!(token_from_request(&TestRequest::default().to_http_request()).is_none());
    }

    #[test]
    fn csrf_only_applies_to_mutating_cookie_requests() {
        let get = TestRequest::get().to_http_request();
        let post = TestRequest::post().to_http_request();
        let matching = TestRequest::post()
            .cookie(Cookie::new(CSRF_COOKIE, "abc"))
            .insert_header((CSRF_HEADER, "abc"))
            .to_http_request();
        let mismatched = TestRequest::delete()
            .cookie(Cookie::new(CSRF_COOKIE, "abc"))
            .insert_header((CSRF_HEADER, "xyz"))
            .to_http_request();

        assert!(csrf_satisfied(&get, TokenSource::Cookie));
        assert!(csrf_satisfied(&post, TokenSource::Bearer));
        assert!(!csrf_satisfied(&post, TokenSource::Cookie));
        assert!(csrf_satisfied(&matching, TokenSource::Cookie));
        assert!(!csrf_satisfied(&mismatched, TokenSource::Cookie));
    }

    #[actix_web::test]
    async fn extractor_accepts_bearer_token() {
        test_env();

        let (user_id, token) = token_for(Role::User);

        let request = TestRequest::post()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_http_request();

        let extracted = Token::extract(&request).await.unwrap();

        assert_eq!(extracted.user_id, user_id);
        assert_eq!(extracted.source, TokenSource::Bearer);
        assert!(!extracted.is_admin());
    }

    #[actix_web::test]
    async fn extractor_rejects_missing_invalid_and_csrf_less_tokens() {
        test_env();

        let missing = Token::extract(&TestRequest::get().to_http_request()).await;

        assert_eq!(missing.unwrap_err().status, 401);

        let garbage = Token::extract(
            &TestRequest::get()
                .insert_header(("Authorization", "Bearer not.a.jwt"))
                .to_http_request()
        )
        .await;

        assert_eq!(garbage.unwrap_err().detail, "Token is not valid");

        let (_, token) = token_for(Role::User);

        let cookie_post = Token::extract(
            &TestRequest::post()
                .cookie(Cookie::new(TOKEN_COOKIE, token.clone()))
                .to_http_request()
        )
        .await;

        assert_eq!(cookie_post.unwrap_err().status, 403);

        let cookie_get = Token::extract(
            &TestRequest::get()
                .cookie(Cookie::new(TOKEN_COOKIE, token))
                .to_http_request()
        )
        .await;

        assert!(cookie_get.is_ok());
    }

    #[actix_web::test]
    async fn owner_or_admin() {
        test_env();

        let (user_id, token) = token_for(Role::User);
        let (_, admin_token) = token_for(Role::Admin);

        let user = Token::verify(token, TokenSource::Bearer).await.unwrap();
        let admin = Token::verify(admin_token, TokenSource::Bearer).await.unwrap();

        let own = Record(Some(user_id));
        let other = Record(Some(ObjectId::new()));
        let orphan = Record(None);

        assert!(user.require_owner_or_admin(&own, "delete", "event").is_ok());

        let error = user
            .require_owner_or_admin(&other, "delete", "event")
            .unwrap_err();

        assert_eq!(error.status, 403);
        assert_eq!(error.detail, "Not authorized to delete this event");

        assert!(user.require_owner_or_admin(&orphan, "update", "announcement").is_err());
        assert!(admin.require_owner_or_admin(&other, "delete", "event").is_ok());
        assert!(admin.require_admin().is_ok());
        assert_eq!(user.require_admin().unwrap_err().status, 403);
    }

    #[test]
    fn csrf_tokens_are_unique_hex() {
        let first = new_csrf_token(TEST_SECRET);
        let second = new_csrf_token(TEST_SECRET);

        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
    }
}
