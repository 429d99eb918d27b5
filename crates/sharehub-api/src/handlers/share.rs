//! Public share handlers.
//!
//! `GET`/`HEAD` serve a file, a directory listing, or a directory as ZIP.
//! `POST` accepts multipart uploads into a shared directory.

use axum::Json;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use sharehub_core::error::AppError;
use sharehub_service::{AccessIntent, DirectoryListing, ShareAccess};

use crate::error::ApiError;
use crate::render::render_listing;
use crate::state::AppState;

/// Query string of download requests.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    /// `zip` requests a directory as a ZIP archive.
    pub download: Option<String>,
}

impl DownloadQuery {
    fn wants_zip(&self) -> bool {
        self.download
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case("zip"))
    }
}

/// Response body of a successful upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Names the files were stored under.
    pub files: Vec<String>,
}

/// GET /{token}
pub async fn download_root(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<DownloadQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    download(state, token, String::new(), query, request).await
}

/// GET /{token}/{*rest}
pub async fn download_path(
    State(state): State<AppState>,
    Path((token, rest)): Path<(String, String)>,
    Query(query): Query<DownloadQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    download(state, token, rest, query, request).await
}

/// POST /{token}
pub async fn upload_root(
    State(state): State<AppState>,
    Path(token): Path<String>,
    request: Request,
) -> Result<Json<UploadResponse>, ApiError> {
    upload(state, token, String::new(), request).await
}

/// POST /{token}/{*rest}
pub async fn upload_path(
    State(state): State<AppState>,
    Path((token, rest)): Path<(String, String)>,
    request: Request,
) -> Result<Json<UploadResponse>, ApiError> {
    upload(state, token, rest, request).await
}

async fn download(
    state: AppState,
    token: String,
    rest: String,
    query: DownloadQuery,
    request: Request,
) -> Result<Response, ApiError> {
    let access = state
        .access_service
        .authorize(&token, &rest, AccessIntent::Download)
        .await?;

    if !access.entry.is_dir {
        let response = ServeFile::new(&access.entry.path)
            .oneshot(request)
            .await
            .map_err(|e| AppError::internal(format!("Failed to serve file: {e}")))?;
        return Ok(response.map(Body::new));
    }

    if query.wants_zip() {
        return Ok(zip_response(&state, &access));
    }

    let listing = DirectoryListing::load(&access).await?;
    Ok(Html(render_listing(&listing)).into_response())
}

fn zip_response(state: &AppState, access: &ShareAccess) -> Response {
    let name = access
        .remainder
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| access.record.target_name());
    let body = state
        .archive_service
        .stream_directory(access.entry.path.clone());

    let mut response = Body::from_stream(body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&format!("{name}.zip"))) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if fallback == file_name {
        format!("attachment; filename=\"{file_name}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            utf8_percent_encode(file_name, NON_ALPHANUMERIC)
        )
    }
}

async fn upload(
    state: AppState,
    token: String,
    rest: String,
    request: Request,
) -> Result<Json<UploadResponse>, ApiError> {
    let access = state
        .access_service
        .authorize(&token, &rest, AccessIntent::Upload)
        .await?;

    let mut multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| AppError::validation(format!("Expected a multipart upload: {}", e.body_text())))?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if !state
            .upload_service
            .accepts(field_name.as_deref(), Some(&file_name))
        {
            continue;
        }

        let stored = state
            .upload_service
            .store(&access, &file_name, field)
            .await?;
        files.push(stored.name);
    }

    if files.is_empty() {
        return Err(AppError::validation("No files in upload").into());
    }
    Ok(Json(UploadResponse { files }))
}
