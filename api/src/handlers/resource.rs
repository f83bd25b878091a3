use std::path::Path;

use actix_files::NamedFile;
use actix_multipart::Multipart;
use actix_web::{
    HttpRequest,
    HttpResponse,
    Responder,
    delete,
    get,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    post,
    put,
    web
};
use bson::{Document, doc, oid::ObjectId};
use bulletin_core::{
    db::{DateTime, FileType, FindOptions, Resource, ResourceCategory},
    env
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::ErrorResponse,
    models::{
        PaginationModel,
        ResourceListModel,
        ResourceModel,
        Token,
        authors
    },
    upload::{
        UploadKind,
        local_path,
        read_multipart,
        remove_stored,
        store,
        validate_file
    },
    validation::{ResourceForm, pagination, search_pattern}
};

pub fn config(cfg: &mut web::ServiceConfig) {
    // the /user routes have to win over /{id}
    cfg.service(
        web::scope("/api/resources")
            .service(list_resources)
            .service(own_resources)
            .service(user_resources)
            .service(get_resource)
            .service(download_resource)
            .service(create_resource)
            .service(update_resource)
            .service(delete_resource)
    );
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceQuery {
    category:  Option<String>,
    file_type: Option<String>,
    search:    Option<String>,
    page:      Option<u64>,
    limit:     Option<u64>
}

fn list_filter(query: &ResourceQuery) -> Result<Document, ErrorResponse> {
    let mut filter = doc! {"isPublic": true};

    match query.category.as_deref() {
        None | Some("") | Some("all") => {}
        Some(category) => {
            let category = category.parse::<ResourceCategory>().map_err(|_| {
                ErrorResponse::bad_request(format!(
                    "Invalid category: {category}. Valid categories are: {}",
                    ResourceCategory::VALUES.join(", ")
                ))
            })?;

            filter.insert("category", category.as_str());
        }
    }

    match query.file_type.as_deref() {
        None | Some("") | Some("all") => {}
        Some(file_type) => {
            let file_type = file_type.parse::<FileType>().map_err(|_| {
                ErrorResponse::bad_request(format!(
                    "Invalid file type: {file_type}. Valid file types are: {}",
                    FileType::VALUES.join(", ")
                ))
            })?;

            filter.insert("fileType", file_type.as_str());
        }
    }

    if let Some(search) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|search| !search.is_empty())
    {
        let pattern = search_pattern(search);

        filter.insert("$or", vec![
            doc! {"title": pattern.clone()},
            doc! {"description": pattern.clone()},
            doc! {"tags": pattern}
        ]);
    }

    Ok(filter)
}

/// Public resources are visible to anyone, private ones to their owner and
/// admins.
fn can_view(resource: &Resource, token: Option<&Token>) -> bool {
    resource.is_public ||
        token.is_some_and(|token| token.is_admin() || token.owns(resource))
}

async fn find_resource(id: ObjectId) -> Result<Resource, ErrorResponse> {
    Resource::find_one(doc! {"_id": id})
        .await?
        .ok_or_else(|| ErrorResponse::not_found("Resource not found"))
}

async fn resource_model(resource: Resource) -> Result<ResourceModel, ErrorResponse> {
    let authors = authors([resource.user]).await?;

    Ok(ResourceModel::new(resource, &authors))
}

async fn resource_models(
    resources: Vec<Resource>
) -> Result<Vec<ResourceModel>, ErrorResponse> {
    let authors = authors(resources.iter().map(|resource| resource.user)).await?;

    Ok(resources
        .into_iter()
        .map(|resource| ResourceModel::new(resource, &authors))
        .collect())
}

#[get("")]
async fn list_resources(
    query: web::Query<ResourceQuery>
) -> Result<impl Responder, ErrorResponse> {
    let filter = list_filter(&query)?;

    let (page, limit, skip) = pagination(query.page, query.limit);

    let total = Resource::count_documents(filter.clone()).await?;

    let resources = Resource::find(
        filter,
        FindOptions::builder()
            .sort(doc! {"createdAt": -1})
            .skip(skip)
            .limit(limit as i64)
            .build()
    )
    .await?;

    Ok(HttpResponse::Ok().json(ResourceListModel {
        resources:  resource_models(resources).await?,
        pagination: PaginationModel::new(total, page, limit)
    }))
}

/// Everything the user uploaded, or only the public part when looking at
/// someone else.
async fn resources_of(user: ObjectId, token: &Token) -> Result<HttpResponse, ErrorResponse> {
    let mut filter = doc! {"user": user};

    if !token.is_admin() && user != token.user_id {
        filter.insert("isPublic", true);
    }

    let resources = Resource::find(
        filter,
        FindOptions::builder().sort(doc! {"createdAt": -1}).build()
    )
    .await?;

    Ok(HttpResponse::Ok().json(resource_models(resources).await?))
}

#[get("/user")]
async fn own_resources(token: Token) -> Result<impl Responder, ErrorResponse> {
    resources_of(token.user_id, &token).await
}

#[get("/user/{user_id}")]
async fn user_resources(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let user = ObjectId::parse_str(path.into_inner())?;

    resources_of(user, &token).await
}

#[get("/{id}")]
async fn get_resource(
    path: web::Path<String>,
    token: Option<Token>
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let resource = find_resource(id).await?;

    if !can_view(&resource, token.as_ref()) {
        return Err(ErrorResponse::forbidden(
            "Not authorized to access this resource"
        ));
    }

    Ok(HttpResponse::Ok().json(resource_model(resource).await?))
}

#[get("/{id}/download")]
async fn download_resource(
    request: HttpRequest,
    path: web::Path<String>,
    token: Option<Token>
) -> Result<HttpResponse, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let resource = find_resource(id).await?;

    if !can_view(&resource, token.as_ref()) {
        return Err(ErrorResponse::forbidden(
            "Not authorized to access this resource"
        ));
    }

    serve_download(&request, &env().upload_dir, resource, |update| async move {
        Resource::update_one(doc! {"_id": id}, update)
            .await
            .map(|_| ())
            .map_err(ErrorResponse::from)
    })
    .await
}

/// The only write a download performs.
fn download_increment() -> Document {
    doc! {"$inc": {"downloads": 1}}
}

/// Streams the resource's file as an attachment, applying `count` with
/// [`download_increment`] only once the file has been opened.
async fn serve_download<F, Fut>(
    request: &HttpRequest,
    root: &Path,
    resource: Resource,
    count: F
) -> Result<HttpResponse, ErrorResponse>
where
    F: FnOnce(Document) -> Fut,
    Fut: Future<Output = Result<(), ErrorResponse>>
{
    let Some(path) = local_path(root, &resource.file_url) else {
        return Err(ErrorResponse::not_found("File not found on server"));
    };

    let file = match NamedFile::open_async(&path).await {
        Ok(file) => file,
        Err(error) => {
            log::warn!(
                "resource {} points at {}: {error}",
                resource.id,
                path.display()
            );

            return Err(ErrorResponse::not_found("File not found on server"));
        }
    };

    count(download_increment()).await?;

    let file_name = if resource.file_name.is_empty() {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        resource.file_name
    };

    Ok(file
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters:  vec![DispositionParam::Filename(file_name)]
        })
        .into_response(request))
}

#[post("")]
async fn create_resource(
    payload: Multipart,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let form = read_multipart(payload, UploadKind::Resource.max_size()).await?;

    let Some(file) = &form.file else {
        return Err(ErrorResponse::bad_request("No file uploaded"));
    };

    let changes = ResourceForm::from_fields(&form.fields).validate(false)?;

    validate_file(UploadKind::Resource, file)?;

    let stored = store(&env().upload_dir, UploadKind::Resource, file).await?;

    let now = DateTime::now();

    let resource = Resource {
        id: ObjectId::new(),
        title: changes.title.unwrap_or_default(),
        description: changes.description.unwrap_or_default(),
        file_url: stored.url,
        file_name: Path::new(&file.original_name)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| stored.file_name.clone()),
        mime_type: file.mime_type(),
        size: file.bytes.len() as i64,
        file_type: FileType::from_extension(&file.extension),
        category: changes.category.unwrap_or_default(),
        tags: changes.tags.unwrap_or_default(),
        user: token.user_id,
        downloads: 0,
        is_public: changes.is_public.unwrap_or(true),
        created_at: now,
        updated_at: now
    };

    if let Err(error) = resource.insert().await {
        remove_stored(&env().upload_dir, &resource.file_url).await;

        return Err(error.into());
    }

    log::info!(
        "user {} uploaded resource {} ({} bytes)",
        token.user_id,
        resource.id,
        resource.size
    );

    Ok(HttpResponse::Created().json(resource_model(resource).await?))
}

#[put("/{id}")]
async fn update_resource(
    path: web::Path<String>,
    body: web::Json<ResourceForm>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let changes = body.into_inner().validate(true)?;

    let resource = find_resource(id).await?;

    token.require_owner_or_admin(&resource, "update", "resource")?;

    match Resource::find_one_and_update(
        doc! {"_id": id},
        doc! {"$set": changes.to_set()}
    )
    .await?
    {
        Some(resource) => Ok(HttpResponse::Ok().json(resource_model(resource).await?)),
        None => Err(ErrorResponse::not_found("Resource not found"))
    }
}

#[delete("/{id}")]
async fn delete_resource(
    path: web::Path<String>,
    token: Token
) -> Result<impl Responder, ErrorResponse> {
    let id = ObjectId::parse_str(path.into_inner())?;

    let resource = find_resource(id).await?;

    token.require_owner_or_admin(&resource, "delete", "resource")?;

    Resource::delete_one(doc! {"_id": id}).await?;

    remove_stored(&env().upload_dir, &resource.file_url).await;

    log::info!("user {} deleted resource {id}", token.user_id);

    Ok(HttpResponse::Ok().json(json!({"message": "Resource deleted successfully"})))
}
