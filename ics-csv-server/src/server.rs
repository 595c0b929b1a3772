use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ics_csv_parser::{convert, Conversion, Diagnostic, EventRecord};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{log_conversion, render};

/// Upload cap, raised from axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

const INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>ICS to CSV</title></head>
<body>
<form action="/upload" method="post" enctype="multipart/form-data">
<input type="file" name="file" accept=".ics,text/calendar">
<button type="submit">Download CSV file</button>
</form>
</body>
</html>
"#;

#[derive(Debug, Clone, Copy)]
pub struct AppState {
    pub preview_rows: usize,
}

#[derive(Deserialize)]
struct PreviewQuery {
    #[serde(default)]
    json: bool,
}

#[derive(Serialize)]
struct PreviewBody<'a> {
    file_name: &'a str,
    total: usize,
    preview: &'a [EventRecord],
    diagnostics: &'a [Diagnostic],
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Html(INDEX) }))
        .route("/upload", post(handle_upload))
        .route("/convert", post(handle_convert))
        .route("/preview", post(handle_preview))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

fn convert_body(source: &str, body: &[u8]) -> Conversion {
    let conversion = convert(String::from_utf8_lossy(body));
    log_conversion(source, &conversion);
    conversion
}

fn csv_download(conversion: Conversion) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", conversion.file_name);

    (
        [
            ("content-type", "text/csv; charset=utf-8".to_string()),
            ("content-disposition", disposition),
            ("x-event-count", conversion.calendar.len().to_string()),
        ],
        conversion.csv,
    )
        .into_response()
}

async fn handle_upload(mut multipart: Multipart) -> Result<Response, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let body = field.bytes().await?;
        info!("file name: {file_name}");

        return Ok(csv_download(convert_body(&file_name, &body)));
    }

    Ok((StatusCode::BAD_REQUEST, "missing `file` field").into_response())
}

async fn handle_convert(body: Bytes) -> Response {
    csv_download(convert_body("request body", &body))
}

async fn handle_preview(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
    body: Bytes,
) -> Response {
    let conversion = convert_body("request body", &body);
    let preview = conversion.calendar.preview(state.preview_rows);

    if query.json {
        return Json(PreviewBody {
            file_name: &conversion.file_name,
            total: conversion.calendar.len(),
            preview,
            diagnostics: &conversion.calendar.diagnostics,
        })
        .into_response();
    }

    Html(render::html_table(preview)).into_response()
}
