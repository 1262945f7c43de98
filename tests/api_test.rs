//! Integration tests for the HTTP API.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use plantid::inference::{InferenceEngine, Model, ScoreVector};
use plantid::labels::LabelMap;
use plantid::pipeline::BatchOptions;
use plantid::preprocess::{InputShape, Tensor};
use plantid::server::{AppState, router};
use serde_json::Value;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "plantid-test-boundary";
const SHAPE: InputShape = InputShape::new(8, 8, 3);
const SPECIES: [&str; 4] = [
    "Quercus robur",
    "Bellis perennis",
    "Taraxacum officinale",
    "Urtica dioica",
];

/// Scores class `i` as `i`, so the ranking is always the reverse label order.
struct RisingModel;

impl Model for RisingModel {
    fn input_shape(&self) -> InputShape {
        SHAPE
    }

    fn num_classes(&self) -> Option<usize> {
        Some(SPECIES.len())
    }

    fn predict(&self, batch: &[&Tensor]) -> plantid::Result<Vec<ScoreVector>> {
        Ok(batch
            .iter()
            .map(|_| (0..SPECIES.len()).map(|i| i as f32 / 10.0).collect())
            .collect())
    }
}

fn defaults() -> BatchOptions {
    BatchOptions {
        top_k: NonZeroUsize::new(2).unwrap(),
        batch_size: NonZeroUsize::new(2).unwrap(),
    }
}

fn ready_app() -> Router {
    let labels = LabelMap::from_names(SPECIES.iter().map(|s| (*s).to_string()).collect()).unwrap();
    let state = AppState::new(InferenceEngine::ready(RisingModel), Some(labels), defaults());
    router(Arc::new(state), 1024 * 1024)
}

fn unready_app() -> Router {
    let state = AppState::new(
        InferenceEngine::unavailable("model file does not exist: missing.onnx"),
        None,
        defaults(),
    );
    router(Arc::new(state), 1024 * 1024)
}

fn png() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 14, Rgb([30, 140, 60])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

enum Part<'a> {
    File(&'a str, Vec<u8>),
    Text(&'a str, &'a str),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File(name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"plant{i}.png\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn predict_request(query: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/predict{query}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_predict_single_image() {
    let (status, json) = send(
        ready_app(),
        predict_request("", &[Part::File("image", png())]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 1);

    // Default top_k is 2; highest score first.
    let first = results[0].as_array().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0]["label"], "Urtica dioica");
    assert_eq!(first[1]["label"], "Taraxacum officinale");
    assert!(first[0]["score"].as_f64().unwrap() >= first[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn test_predict_corrupt_image_is_isolated() {
    let parts = [
        Part::File("images", png()),
        Part::File("images", b"definitely not an image".to_vec()),
        Part::File("images", png()),
    ];
    let (status, json) = send(ready_app(), predict_request("?top_k=1", &parts)).await;

    assert_eq!(status, StatusCode::OK);
    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0].as_array().unwrap().len(), 1);
    assert_eq!(results[2].as_array().unwrap().len(), 1);

    let error = results[1].as_str().unwrap();
    assert!(error.starts_with("Error processing image 1:"), "{error}");
}

#[tokio::test]
async fn test_predict_top_k_is_clamped_to_class_count() {
    let (status, json) = send(
        ready_app(),
        predict_request("?top_k=50", &[Part::File("image", png())]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0].as_array().unwrap().len(), SPECIES.len());
}

#[tokio::test]
async fn test_predict_rejects_invalid_top_k() {
    for raw in ["0", "-1", "abc", "2.5"] {
        let (status, json) = send(
            ready_app(),
            predict_request(&format!("?top_k={raw}"), &[Part::File("image", png())]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "top_k={raw}");
        assert!(json["error"].as_str().unwrap().contains("top_k"));
    }
}

#[tokio::test]
async fn test_predict_top_k_form_field() {
    let parts = [Part::Text("top_k", "3"), Part::File("file", png())];
    let (status, json) = send(ready_app(), predict_request("", &parts)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_predict_query_top_k_wins_over_form_field() {
    let parts = [Part::Text("top_k", "3"), Part::File("image", png())];
    let (status, json) = send(ready_app(), predict_request("?top_k=1", &parts)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_predict_without_images_is_rejected() {
    let (status, json) = send(
        ready_app(),
        predict_request("", &[Part::Text("note", "hello")]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_predict_when_model_not_loaded() {
    let (status, json) = send(
        unready_app(),
        predict_request("", &[Part::File("image", png())]),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("model is not loaded")
    );
}

#[tokio::test]
async fn test_unready_check_precedes_top_k_validation() {
    let (status, _) = send(
        unready_app(),
        predict_request("?top_k=abc", &[Part::File("image", png())]),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unready_check_precedes_query_parsing() {
    let (status, json) = send(
        unready_app(),
        predict_request("?top_k=1&top_k=2", &[Part::File("image", png())]),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("model is not loaded")
    );
}

#[tokio::test]
async fn test_malformed_query_is_json_bad_request() {
    let (status, json) = send(
        ready_app(),
        predict_request("?top_k=1&top_k=2", &[Part::File("image", png())]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_health_ready() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, json) = send(ready_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["classes"], SPECIES.len());
}

#[tokio::test]
async fn test_health_unready() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, json) = send(unready_app(), request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unavailable");
    assert!(json["reason"].as_str().unwrap().contains("missing.onnx"));
}
