use actix_web::{
    HttpRequest,
    HttpResponse,
    HttpResponseBuilder,
    Responder,
    get,
    post,
    put,
    web
};
use bson::{doc, oid::ObjectId};
use bulletin_core::{
    db::{DateTime, Role, User},
    env,
    redis::{is_token_revoked, revoke_token}
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::ErrorResponse,
    models::{
        AuthModel,
        Claims,
        Token,
        UserModel,
        removed_token_cookie,
        token_cookie,
        token_from_request
    },
    validation::{LoginForm, RegisterForm}
};

pub fn config(cfg: &mut web::ServiceConfig) {
    // both prefixes are in use by the front end
    for prefix in ["/api/users", "/api/auth"] {
        cfg.service(
            web::scope(prefix)
                .service(register)
                .service(login)
                .service(profile)
                .service(refresh_token)
                .service(logout)
                .service(set_role)
        );
    }
}

async fn hash_password(password: String) -> Result<String, ErrorResponse> {
    match tokio::task::spawn_blocking(move || {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
    })
    .await
    {
        Ok(Ok(hash)) => Ok(hash),
        Ok(Err(error)) => Err(ErrorResponse::default().with_internal(error)),
        Err(error) => Err(ErrorResponse::default().with_internal(error))
    }
}

async fn verify_password(password: String, hash: String) -> bool {
    matches!(
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await,
        Ok(Ok(true))
    )
}

fn issue_token(user: &User) -> Result<String, ErrorResponse> {
    Claims::new(user.id, user.name.clone(), user.role, env().token_ttl_secs)
        .encode(&env().jwt_secret)
}

/// Issues a fresh token as both the body and the session cookie.
fn authenticated(
    mut response: HttpResponseBuilder,
    user: &User
) -> Result<HttpResponse, ErrorResponse> {
    let token = issue_token(user)?;

    Ok(response
        .cookie(token_cookie(&token))
        .json(AuthModel::new(user, token)))
}

#[post("/register")]
async fn register(
    body: web::Json<RegisterForm>
) -> Result<impl Responder, ErrorResponse> {
    let registration = body.into_inner().validate()?;

    if User::find_one(doc! {
        "$or": [
            {"email": registration.email.as_str()},
            {"name": registration.name.as_str()}
        ]
    })
    .await?
    .is_some()
    {
        return Err(ErrorResponse::bad_request("User already exists"));
    }

    let user = User::new(
        registration.name,
        registration.email,
        hash_password(registration.password).await?
    );

    // the unique indexes still catch a concurrent registration
    user.insert().await?;

    log::info!("registered user {} ({})", user.name, user.id);

    authenticated(HttpResponse::Created(), &user)
}

#[post("/login")]
async fn login(
    body: web::Json<LoginForm>
) -> Result<impl Responder, ErrorResponse> {
    let (identifier, password) = body.into_inner().validate()?;

    let Some(user) = User::find_one(identifier.query()).await? else {
        return Err(ErrorResponse::unauthorized("Invalid credentials"));
    };

    if !verify_password(password, user.password.clone()).await {
        return Err(ErrorResponse::unauthorized("Invalid credentials"));
    }

    authenticated(HttpResponse::Ok(), &user)
}

#[get("/profile")]
async fn profile(token: Token) -> Result<impl Responder, ErrorResponse> {
    match User::find_one(doc! {"_id": token.user_id}).await? {
        Some(user) => Ok(HttpResponse::Ok().json(UserModel::from(user))),
        None => Err(ErrorResponse::not_found("User not found"))
    }
}

#[derive(Deserialize)]
struct RefreshForm {
    token: Option<String>
}

#[post("/refresh-token")]
async fn refresh_token(
    request: HttpRequest,
    body: Option<web::Json<RefreshForm>>
) -> Result<impl Responder, ErrorResponse> {
    let Some(raw) = body
        .and_then(|body| body.into_inner().token)
        .filter(|token| !token.is_empty())
        .or_else(|| token_from_request(&request).map(|(token, _)| token))
    else {
        return Err(ErrorResponse::bad_request("Token is required"));
    };

    let claims = Claims::decode_for_refresh(
        &raw,
        &env().jwt_secret,
        env().refresh_grace_secs
    )
    .map_err(|error| ErrorResponse {
        detail: "Invalid or expired token".to_string(),
        ..error
    })?;

    if is_token_revoked(&claims.jti).await? {
        return Err(ErrorResponse::unauthorized("Invalid or expired token"));
    }

    // role or name may have changed since the token was issued
    let Some(user) = User::find_one(doc! {"_id": claims.user_id()?}).await?
    else {
        return Err(ErrorResponse::unauthorized("Invalid or expired token"));
    };

    revoke_token(&claims.jti, claims.remaining_secs()).await?;

    authenticated(HttpResponse::Ok(), &user)
}

#[post("/logout")]
async fn logout(request: HttpRequest) -> Result<impl Responder, ErrorResponse> {
    if let Some(claims) = token_from_request(&request)
        .and_then(|(token, _)| Claims::decode(&token, &env().jwt_secret).ok())
    {
        revoke_token(&claims.jti, claims.remaining_secs()).await?;

        log::debug!("revoked token {} for user {}", claims.jti, claims.sub);
    }

    Ok(HttpResponse::Ok()
        .cookie(removed_token_cookie())
        .json(json!({"message": "Logged out successfully"})))
}

#[derive(Deserialize)]
struct RoleForm {
    role: String
}

#[put("/{id}/role")]
async fn set_role(
    path: web::Path<String>,
    body: web::Json<RoleForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    token.require_admin()?;

    let id = ObjectId::parse_str(path.into_inner())?;

    let Ok(role) = body.role.parse::<Role>() else {
        return Err(ErrorResponse::bad_request(format!(
            "Invalid role: {}. Valid roles are: {}",
            body.role,
            Role::VALUES.join(", ")
        )));
    };

    match User::find_one_and_update(
        doc! {"_id": id},
        doc! {"$set": {"role": role.as_str(), "updatedAt": DateTime::now()}}
    )
    .await?
    {
        Some(user) => {
            log::info!("{} set role of {} to {role}", token.user_id, user.id);

            Ok(HttpResponse::Ok().json(UserModel::from(user)))
        }
        None => Err(ErrorResponse::not_found("User not found"))
    }
}
