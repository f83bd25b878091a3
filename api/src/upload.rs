use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf}
};

use actix_files::Files;
use actix_multipart::Multipart;
use bson::oid::ObjectId;
use bulletin_core::env;
use futures_util::TryStreamExt;

use crate::error::ErrorResponse;

/// Text fields are small; anything larger is almost certainly a mistake.
const MAX_FIELD_SIZE: usize = 64 * 1024;
/// No upload form has more than a handful of text fields.
const MAX_FIELDS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Poster,
    Resource
}

impl UploadKind {
    pub fn directory(self) -> &'static str {
        match self {
            UploadKind::Poster => "posters",
            UploadKind::Resource => "resources"
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            UploadKind::Poster => "poster",
            UploadKind::Resource => "resource"
        }
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            UploadKind::Poster => &["png", "jpg", "jpeg"],
            UploadKind::Resource => &[
                "pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "txt",
                "png", "jpg", "jpeg", "gif"
            ]
        }
    }

    pub fn max_size(self) -> u64 {
        match self {
            UploadKind::Poster => env().max_poster_size,
            UploadKind::Resource => env().max_resource_size
        }
    }
}

#[derive(Debug)]
pub struct UploadedFile {
    /// name as sent by the client
    pub original_name: String,
    /// lower-case, without the dot
    pub extension:     String,
    pub bytes:         Vec<u8>
}

impl UploadedFile {
    pub fn mime_type(&self) -> Option<String> {
        mime_guess::from_ext(&self.extension)
            .first_raw()
            .map(str::to_string)
    }
}

#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file:   Option<UploadedFile>
}

pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
}

/// Whether the leading bytes are what a file with `extension` should start
/// with.
pub fn content_matches_extension(extension: &str, bytes: &[u8]) -> bool {
    const OLE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    const ZIP: &[u8] = b"PK\x03\x04";

    match extension {
        "pdf" => bytes.starts_with(b"%PDF-"),
        "png" => bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "jpg" | "jpeg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "gif" => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
        "docx" | "pptx" | "xlsx" => bytes.starts_with(ZIP),
        "doc" | "ppt" | "xls" => bytes.starts_with(OLE),
        "txt" => !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok(),
        _ => false
    }
}

/// Checks the extension allowlist and the file's magic bytes.
pub fn validate_file(kind: UploadKind, file: &UploadedFile) -> Result<(), ErrorResponse> {
    if !kind.allowed_extensions().contains(&file.extension.as_str()) {
        return Err(ErrorResponse::bad_request(format!(
            "Invalid file type. Allowed types: {}",
            kind.allowed_extensions().join(", ")
        )));
    }

    if file.bytes.is_empty() {
        return Err(ErrorResponse::bad_request("Uploaded file is empty"));
    }

    if !content_matches_extension(&file.extension, &file.bytes) {
        return Err(ErrorResponse::bad_request(
            "File content does not match its extension"
        ));
    }

    Ok(())
}

/// Reads every part of a multipart body, keeping text fields and at most
/// one file, and failing as soon as the file grows past `max_size`.
pub async fn read_multipart(
    mut payload: Multipart,
    max_size: u64
) -> Result<MultipartForm, ErrorResponse> {
    let mut form = MultipartForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();

        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_string);

        match file_name {
            // browsers send an empty file part when nothing was picked
            Some(file_name) if file_name.is_empty() => {
                while field.try_next().await?.is_some() {}
            }
            Some(file_name) => {
                if form.file.is_some() {
                    return Err(ErrorResponse::bad_request(
                        "Only one file may be uploaded"
                    ));
                }

                let mut bytes = Vec::new();

                while let Some(chunk) = field.try_next().await? {
                    if (bytes.len() + chunk.len()) as u64 > max_size {
                        return Err(ErrorResponse::bad_request("File too large"));
                    }

                    bytes.extend_from_slice(&chunk);
                }

                form.file = Some(UploadedFile {
                    extension: extension_of(&file_name).unwrap_or_default(),
                    original_name: file_name,
                    bytes
                });
            }
            None => {
                if form.fields.len() >= MAX_FIELDS && !form.fields.contains_key(&name) {
                    return Err(ErrorResponse::bad_request("Too many form fields"));
                }

                let mut value = Vec::new();

                while let Some(chunk) = field.try_next().await? {
                    if value.len() + chunk.len() > MAX_FIELD_SIZE {
                        return Err(ErrorResponse::bad_request(format!(
                            "Form field {name} is too large"
                        )));
                    }

                    value.extend_from_slice(&chunk);
                }

                let value = String::from_utf8(value).map_err(|_| {
                    ErrorResponse::bad_request(format!(
                        "Form field {name} is not valid text"
                    ))
                })?;

                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// `/uploads/<kind directory>/<file name>`
    pub url:       String,
    pub file_name: String
}

/// Writes `file` under `<root>/<kind directory>/` with a generated name.
pub async fn store(
    root: &Path,
    kind: UploadKind,
    file: &UploadedFile
) -> Result<StoredFile, ErrorResponse> {
    let directory = root.join(kind.directory());

    tokio::fs::create_dir_all(&directory).await?;

    let file_name = format!(
        "{}-{}.{}",
        kind.prefix(),
        ObjectId::new().to_hex(),
        file.extension
    );

    let path = directory.join(&file_name);

    tokio::fs::write(&path, &file.bytes).await?;

    log::debug!("stored upload {} as {}", file.original_name, path.display());

    Ok(StoredFile {
        url: format!("/uploads/{}/{file_name}", kind.directory()),
        file_name
    })
}

/// Static service for poster images. Resource files stay off the static
/// tree and are only reachable through their download route.
pub fn poster_files(root: &Path) -> Files {
    let directory = UploadKind::Poster.directory();

    Files::new(&format!("/uploads/{directory}"), root.join(directory))
}

/// Maps a public `/uploads/...` url back to a file under `root`, refusing
/// anything that could leave the upload directories.
pub fn local_path(root: &Path, url: &str) -> Option<PathBuf> {
    let relative = url.strip_prefix("/uploads/")?;

    let (directory, file_name) = relative.split_once('/')?;

    if ![UploadKind::Poster, UploadKind::Resource]
        .iter()
        .any(|kind| kind.directory() == directory)
    {
        return None;
    }

    if file_name.is_empty() ||
        file_name.starts_with('.') ||
        file_name.contains(['/', '\\'])
    {
        return None;
    }

    Some(root.join(directory).join(file_name))
}

/// Deletes a stored upload; a file that is already gone is not an error.
pub async fn remove_stored(root: &Path, url: &str) {
    let Some(path) = local_path(root, url) else {
        log::warn!("refusing to remove upload outside the upload directory: {url}");
        return;
    };

    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => log::warn!("failed to remove {}: {error}", path.display())
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{
        error::PayloadError,
        http::header::{self, HeaderMap, HeaderValue},
        web::Bytes
    };

    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn upload(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            extension:     extension_of(name).unwrap_or_default(),
            bytes:         bytes.to_vec()
        }
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("bulletin-upload-{}", ObjectId::new().to_hex()))
    }

    fn multipart(body: &'static str) -> Multipart {
        let mut headers = HeaderMap::new();

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=XBOUNDARY")
        );

        let stream = futures_util::stream::once(async move {
            Ok::<_, PayloadError>(Bytes::from_static(body.as_bytes()))
        });

        Multipart::new(&headers, stream)
    }

    #[test]
    fn magic_bytes() {
        assert!(content_matches_extension("pdf", b"%PDF-1.7\n"));
        assert!(content_matches_extension("png", PNG));
        assert!(content_matches_extension("jpeg", &[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(content_matches_extension("gif", b"GIF89a..."));
        assert!(content_matches_extension("docx", b"PK\x03\x04rest"));
        assert!(content_matches_extension(
            "xls",
            &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0x00]
        ));
        assert!(content_matches_extension("txt", "plain notes ✓".as_bytes()));

        assert!(!content_matches_extension("pdf", PNG));
        assert!(!content_matches_extension("png", b"%PDF-1.7"));
        assert!(!content_matches_extension("txt", b"bin\0ary"));
        assert!(!content_matches_extension("exe", b"MZ"));
    }

    #[test]
    fn renamed_executable_is_rejected() {
        let error = validate_file(UploadKind::Resource, &upload("notes.pdf", b"MZ\x90\0"))
            .unwrap_err();

        assert_eq!(error.status, 400);
        assert_eq!(error.detail, "File content does not match its extension");
    }

    #[test]
    fn extension_allowlist_per_kind() {
        assert!(validate_file(UploadKind::Poster, &upload("flyer.PNG", PNG)).is_ok());
        assert!(validate_file(UploadKind::Resource, &upload("flyer.png", PNG)).is_ok());

        let error =
            validate_file(UploadKind::Poster, &upload("flyer.gif", b"GIF89a")).unwrap_err();

        assert_eq!(error.detail, "Invalid file type. Allowed types: png, jpg, jpeg");

        assert!(validate_file(UploadKind::Resource, &upload("empty.txt", b"")).is_err());
    }

    #[test]
    fn local_paths_stay_inside_the_upload_root() {
        let root = Path::new("/srv/uploads");

        assert_eq!(
            local_path(root, "/uploads/posters/poster-abc.png"),
            Some(PathBuf::from("/srv/uploads/posters/poster-abc.png"))
        );
        assert!(local_path(root, "/uploads/posters/../../etc/passwd").is_none());
        assert!(local_path(root, "/uploads/other/file.png").is_none());
        assert!(local_path(root, "/uploads/resources/..").is_none());
        assert!(local_path(root, "/static/file.png").is_none());
        assert!(local_path(root, "/uploads/resources/").is_none());
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(upload("a.pdf", b"").mime_type().as_deref(), Some("application/pdf"));
        assert_eq!(upload("a.png", b"").mime_type().as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn store_and_remove() {
        let root = scratch_dir();

        let stored = store(&root, UploadKind::Poster, &upload("flyer.png", PNG))
            .await
            .unwrap();

        assert!(stored.url.starts_with("/uploads/posters/poster-"));
        assert!(stored.url.ends_with(".png"));
        let path = root.join("posters").join(&stored.file_name);

        assert_eq!(local_path(&root, &stored.url), Some(path.clone()));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), PNG);

        remove_stored(&root, &stored.url).await;

        assert!(!path.exists());

        // second removal is a no-op
        remove_stored(&root, &stored.url).await;

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[actix_web::test]
    async fn reads_fields_and_file() {
        let form = read_multipart(
            multipart(
                "--XBOUNDARY\r\n\
                 Content-Disposition: form-data; name=\"title\"\r\n\r\n\
                 Syllabus\r\n\
                 --XBOUNDARY\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"Notes.TXT\"\r\n\
                 Content-Type: text/plain\r\n\r\n\
                 week one\r\n\
                 --XBOUNDARY--\r\n"
            ),
            1024
        )
        .await
        .unwrap();

        assert_eq!(form.fields.get("title").map(String::as_str), Some("Syllabus"));

        let file = form.file.unwrap();

        assert_eq!(file.original_name, "Notes.TXT");
        assert_eq!(file.extension, "txt");
        assert_eq!(file.bytes, b"week one");
    }

    #[actix_web::test]
    async fn oversized_file_is_rejected_while_streaming() {
        let error = read_multipart(
            multipart(
                "--XBOUNDARY\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"big.txt\"\r\n\r\n\
                 0123456789abcdef\r\n\
                 --XBOUNDARY--\r\n"
            ),
            8
        )
        .await
        .unwrap_err();

        assert_eq!(error.detail, "File too large");
    }

    fn text_fields(count: usize) -> &'static str {
        let body: String = (0..count)
            .map(|index| {
                format!(
                    "--XBOUNDARY\r\n\
                     Content-Disposition: form-data; name=\"field{index}\"\r\n\r\n\
                     x\r\n"
                )
            })
            .chain(std::iter::once("--XBOUNDARY--\r\n".to_string()))
            .collect();

        body.leak()
    }

    #[actix_web::test]
    async fn only_posters_are_served_statically() {
        let root = scratch_dir();

        let poster = store(&root, UploadKind::Poster, &upload("flyer.png", PNG))
            .await
            .unwrap();
        let resource = store(&root, UploadKind::Resource, &upload("notes.png", PNG))
            .await
            .unwrap();

        let app = actix_web::test::init_service(
            actix_web::App::new().service(poster_files(&root))
        )
        .await;

        let response = actix_web::test::call_service(
            &app,
            actix_web::test::TestRequest::get().uri(&poster.url).to_request()
        )
        .await;

        assert_eq!(response.status(), actix_web::http::StatusCode::OK);

        let response = actix_web::test::call_service(
            &app,
            actix_web::test::TestRequest::get().uri(&resource.url).to_request()
        )
        .await;

        assert_eq!(response.status(), actix_web::http::StatusCode::NOT_FOUND);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[actix_web::test]
    async fn field_count_is_capped() {
        let form = read_multipart(multipart(text_fields(MAX_FIELDS)), 1024)
            .await
            .unwrap();

        assert_eq!(form.fields.len(), MAX_FIELDS);

        let error = read_multipart(multipart(text_fields(MAX_FIELDS + 1)), 1024)
            .await
            .unwrap_err();

        assert_eq!(error.status, 400);
        assert_eq!(error.detail, "Too many form fields");
    }
}
