use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use super::models::{EntryIdQuery, PhraseQuery, ServerError, required_param};
use super::state::ServerState;
use crate::Backend;
use crate::entries::{Entry, ImageUpload, PageableResult};
use crate::languages::LanguagePair;
use crate::settings;

pub async fn run_server(settings: settings::Settings, addr: String, backend: Backend) -> Result<()> {
    let service = crate::build_service(&settings, backend)?;
    let state = Arc::new(ServerState {
        service,
        image_context: settings.image_upload_context.clone(),
    });
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address {}", addr))?;
    info!("dictionary search listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn build_router(state: Arc<ServerState>) -> Router {
    let images = format!("{}/:file", state.image_context.trim_end_matches('/'));
    Router::new()
        .route("/health", get(health))
        .route("/search/v1/translations/:lang/fuzzy/", get(fuzzy_search))
        .route(
            "/search/v1/translations/:lang/",
            get(exact_search).post(create_entry).put(update_entry),
        )
        .route("/search/v1/translations/:lang/file", post(update_entry_image))
        .route("/search/v1/translations/:lang/:entry_id", delete(delete_entry))
        .route("/search/v1/translation/:lang/", get(get_entry))
        .route(&images, get(serve_image))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

fn parse_pair(lang: &str) -> Result<LanguagePair, ServerError> {
    lang.parse::<LanguagePair>()
        .map_err(|err| ServerError::bad_request(err.to_string()))
}

async fn fuzzy_search(
    State(state): State<Arc<ServerState>>,
    Path(lang): Path<String>,
    Query(query): Query<PhraseQuery>,
) -> Result<Json<PageableResult>, ServerError> {
    let pair = parse_pair(&lang)?;
    let phrase = required_param("phrase", query.phrase.as_deref())?;
    let result = state
        .service
        .get_all_partial(&phrase, pair, query.page.unwrap_or(0))
        .await?;
    Ok(Json(result))
}

async fn exact_search(
    State(state): State<Arc<ServerState>>,
    Path(lang): Path<String>,
    Query(query): Query<PhraseQuery>,
) -> Result<Json<Vec<Entry>>, ServerError> {
    let pair = parse_pair(&lang)?;
    let phrase = required_param("phrase", query.phrase.as_deref())?;
    Ok(Json(state.service.get_all_exact(&phrase, pair).await?))
}

async fn get_entry(
    State(state): State<Arc<ServerState>>,
    Path(lang): Path<String>,
    Query(query): Query<EntryIdQuery>,
) -> Result<Json<Option<Entry>>, ServerError> {
    let pair = parse_pair(&lang)?;
    let entry_id = required_param("entryId", query.entry_id.as_deref())?;
    Ok(Json(state.service.get(&entry_id, pair).await?))
}

async fn create_entry(
    State(state): State<Arc<ServerState>>,
    Path(lang): Path<String>,
    Json(entry): Json<Entry>,
) -> Result<Json<Entry>, ServerError> {
    let pair = parse_pair(&lang)?;
    Ok(Json(state.service.create(entry, pair).await?))
}

async fn update_entry(
    State(state): State<Arc<ServerState>>,
    Path(lang): Path<String>,
    Json(entry): Json<Entry>,
) -> Result<Json<Entry>, ServerError> {
    let pair = parse_pair(&lang)?;
    Ok(Json(state.service.update(entry, pair).await?))
}

async fn update_entry_image(
    State(state): State<Arc<ServerState>>,
    Path(lang): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Entry>, ServerError> {
    let pair = parse_pair(&lang)?;
    let mut entry_id = None;
    let mut upload = ImageUpload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::bad_request(format!("invalid multipart body: {}", err)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "entryId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ServerError::bad_request(format!("invalid entryId: {}", err)))?;
                entry_id = Some(text);
            }
            "imageFile" => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ServerError::bad_request(format!("invalid imageFile: {}", err)))?
                    .to_vec();
            }
            _ => {}
        }
    }
    let entry_id = required_param("entryId", entry_id.as_deref())?;
    Ok(Json(
        state
            .service
            .update_with_image(&entry_id, pair, &upload)
            .await?,
    ))
}

async fn delete_entry(
    State(state): State<Arc<ServerState>>,
    Path((lang, entry_id)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    let pair = parse_pair(&lang)?;
    let entry_id = required_param("entryId", Some(entry_id.as_str()))?;
    state.service.delete(&entry_id, pair).await?;
    Ok(StatusCode::OK)
}

async fn serve_image(
    State(state): State<Arc<ServerState>>,
    Path(file): Path<String>,
) -> Result<Response<Body>, ServerError> {
    if file.starts_with('.') || file.contains(['/', '\\']) {
        return Err(ServerError::not_found(format!("image not found: {}", file)));
    }
    let path = state.service.image_dir().join(&file);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ServerError::not_found(format!("image not found: {}", file)))?;
    Response::builder()
        .header(header::CONTENT_TYPE, image_mime(&file))
        .body(Body::from(bytes))
        .map_err(|err| ServerError::internal(err.to_string()))
}

fn image_mime(file: &str) -> &'static str {
    let ext = file
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
