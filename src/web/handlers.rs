//! Request handlers, one per form action.
//!
//! Every handler resolves the browser's session from its cookie first and
//! re-issues the cookie on the response.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, HeaderName};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use tracing::{info, warn};

use super::error::AppError;
use super::render::render_page;
use super::AppState;
use crate::ocr::suggest_from_image;
use crate::report::{render_docx, DOCX_MIME};
use crate::session::upload::decode_uploads;
use crate::session::{FormSubmission, SessionId};

pub const SESSION_COOKIE: &str = "echo_report_session";

/// Reads the session id from the `Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn cookie_value(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

fn set_cookie(id: &str) -> [(HeaderName, String); 1] {
    [(header::SET_COOKIE, cookie_value(id))]
}

fn back_to_form(id: &str) -> Response {
    (set_cookie(id), Redirect::to("/")).into_response()
}

/// `Content-Disposition` for the download, with an ASCII fallback name and
/// the exact UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

async fn resolve_session(state: &AppState, headers: &HeaderMap) -> SessionId {
    let cookie = session_cookie(headers);
    state.sessions.resolve(cookie.as_deref(), &state.config).await
}

pub async fn health() -> &'static str {
    "OK"
}

/// Renders the form for the current session.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let id = resolve_session(&state, &headers).await;
    let page = state
        .sessions
        .read_session(&id, render_page)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {}", id)))?;

    Ok((set_cookie(&id), Html(page)).into_response())
}

/// Replaces the session's images with the uploaded files.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let id = resolve_session(&state, &headers).await;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("images") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        // An empty file input still posts one nameless, empty part
        if filename.is_empty() && data.is_empty() {
            continue;
        }
        files.push((filename, data.to_vec()));
    }

    let received = files.len();
    let (images, rejected) = tokio::task::spawn_blocking(move || decode_uploads(files)).await?;
    let accepted = state
        .sessions
        .with_session(&id, |s| s.set_images(images, rejected))
        .await
        .unwrap_or(0);

    info!("Session {}: {} of {} files accepted", id, accepted, received);
    Ok(back_to_form(&id))
}

/// Runs OCR on the first image and stores the suggestion.
pub async fn suggest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<FormSubmission>,
) -> Result<Response, AppError> {
    let id = resolve_session(&state, &headers).await;

    let first_image = state
        .sessions
        .with_session(&id, |s| {
            s.apply_form(&form);
            s.images.first().map(|img| img.bytes.clone())
        })
        .await
        .flatten();

    let Some(bytes) = first_image else {
        return Ok(back_to_form(&id));
    };

    let recognizer = state.recognizer.clone();
    let threshold = state.config.ocr_threshold;
    let outcome =
        tokio::task::spawn_blocking(move || suggest_from_image(&bytes, recognizer.as_ref(), threshold))
            .await?;

    state
        .sessions
        .with_session(&id, |s| match outcome {
            Ok(value) => s.record_suggestion(value),
            Err(e) => {
                warn!("Session {}: suggestion failed: {:#}", id, e);
                s.record_ocr_error(format!("Could not read the first image: {:#}", e));
            }
        })
        .await;

    Ok(back_to_form(&id))
}

/// Builds the report and returns it as a download.
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<FormSubmission>,
) -> Result<Response, AppError> {
    let id = resolve_session(&state, &headers).await;

    let draft = state
        .sessions
        .with_session(&id, |s| {
            s.apply_form(&form);
            s.has_images().then(|| s.draft(&state.config.study_date))
        })
        .await
        .flatten();

    let Some(draft) = draft else {
        return Ok(back_to_form(&id));
    };

    let filename = draft.filename();
    let width = state.config.image_width_inches;
    let bytes = tokio::task::spawn_blocking(move || render_docx(&draft, width)).await??;

    Ok((
        [
            (header::SET_COOKIE, cookie_value(&id)),
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        bytes,
    )
        .into_response())
}

/// Serves a PNG thumbnail of the image at `index`.
pub async fn thumbnail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(index): Path<usize>,
) -> Result<Response, AppError> {
    let id = resolve_session(&state, &headers).await;

    let image = state
        .sessions
        .read_session(&id, |s| s.images.get(index).cloned())
        .await
        .flatten()
        .ok_or_else(|| AppError::NotFound(format!("image {}", index)))?;

    let size = state.config.thumbnail_size;
    let png = tokio::task::spawn_blocking(move || image.thumbnail_png(size)).await??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Ends the session; the next request starts a fresh one.
pub async fn reset(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_cookie(&headers) {
        state.sessions.remove(&id).await;
    }
    (
        [(
            header::SET_COOKIE,
            format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE),
        )],
        Redirect::to("/"),
    )
        .into_response()
}
