//! Request handlers and router.

use crate::config::parse_top_k;
use crate::constants::{IMAGE_FIELD_NAMES, TOP_K_PARAM};
use crate::error::Error;
use crate::output::ItemOutcome;
use crate::pipeline::{BatchOptions, classify_batch};
use crate::server::{ApiError, AppState};
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Build the application router.
pub fn router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PredictQuery {
    top_k: Option<String>,
}

/// Images and form fields pulled out of a multipart body.
#[derive(Debug, Default)]
struct Upload {
    images: Vec<Bytes>,
    top_k: Option<String>,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PredictQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<ItemOutcome>>, ApiError> {
    // Readiness first: an unready service must not read or decode anything.
    state.readiness()?;

    let Query(query) = query?;
    let query_top_k = query.top_k.as_deref().map(parse_top_k).transpose()?;

    let upload = read_upload(multipart?).await?;
    let top_k = match (query_top_k, upload.top_k.as_deref()) {
        (Some(k), _) => k,
        (None, Some(raw)) => parse_top_k(raw)?,
        (None, None) => state.defaults().top_k,
    };

    if upload.images.is_empty() {
        return Err(Error::Validation {
            message: "no image files in upload".to_string(),
        }
        .into());
    }

    let options = BatchOptions {
        top_k,
        ..state.defaults()
    };
    debug!(
        "Classifying {} image(s) with top_k={}",
        upload.images.len(),
        top_k
    );

    let images = upload.images;
    let outcomes = tokio::task::spawn_blocking(move || {
        let (engine, labels) = state.readiness()?;
        classify_batch(engine, labels, &images, options)
    })
    .await
    .map_err(|e| Error::Internal {
        message: format!("classification task failed: {e}"),
    })??;

    Ok(Json(outcomes))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == TOP_K_PARAM {
            upload.top_k = Some(field.text().await?);
        } else if field.file_name().is_some() || IMAGE_FIELD_NAMES.contains(&name.as_str()) {
            upload.images.push(field.bytes().await?);
        } else {
            debug!("Ignoring multipart field '{name}'");
        }
    }

    Ok(upload)
}

async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.readiness() {
        Ok((_, labels)) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "classes": labels.len() })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "reason": e.to_string() })),
        )
            .into_response(),
    }
}
