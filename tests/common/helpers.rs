// tests/common/helpers.rs
//! Shared helper functions for integration tests

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mime::Mime;
use serde_json::json;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tower::ServiceExt;
use uuid::Uuid;

use lostfound_server::{
    auth::{AuthResponse, SessionStore},
    create_router,
    models::ImageUpload,
    repositories::{
        account_repository::InMemoryAccountRepository,
        feedback_repository::InMemoryFeedbackRepository, item_repository::InMemoryItemRepository,
    },
    storage::{ImageStorage, ImageStorageError},
    store::ItemStore,
    AppState,
};

/// Image storage fake: hands back a deterministic URL and counts uploads so
/// tests can assert when the host was (not) called.
#[derive(Default)]
pub struct RecordingImageStorage {
    pub uploads: AtomicUsize,
}

#[async_trait]
impl ImageStorage for RecordingImageStorage {
    async fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        mime: &Mime,
    ) -> Result<ImageUpload, ImageStorageError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(ImageUpload {
            url: format!("https://images.test/{filename}"),
            name: filename.to_string(),
            size: bytes.len() as u64,
            mime: mime.to_string(),
        })
    }
}

pub fn create_test_app_with(storage: Arc<RecordingImageStorage>) -> (Router, AppState) {
    let state = AppState {
        items: ItemStore::new(Arc::new(InMemoryItemRepository::new())),
        feedback: Arc::new(InMemoryFeedbackRepository::new()),
        accounts: Arc::new(InMemoryAccountRepository::new()),
        sessions: SessionStore::new(),
        image_storage: storage,
    };
    (create_router(state.clone()), state)
}

pub fn create_test_app() -> (Router, AppState) {
    create_test_app_with(Arc::new(RecordingImageStorage::default()))
}

/// Register an account and return its session token plus user.
pub async fn register_user(app: &Router, name: &str, email: &str, password: &str) -> AuthResponse {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri("/auth/register")
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(
                    json!({ "name": name, "email": email, "password": password }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Failed to register: {}",
        String::from_utf8_lossy(&body)
    );
    serde_json::from_slice(&body).expect("Failed to deserialize auth response in helper")
}

// Function to generate a random boundary string
pub fn generate_boundary() -> String {
    format!("----WebKitFormBoundary{}", Uuid::new_v4().simple())
}

pub fn push_text_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

pub fn push_file_field(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
}

pub fn close_body(body: &mut Vec<u8>, boundary: &str) {
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
}

pub struct ItemFields<'a> {
    pub item_type: &'a str,
    pub title: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub date: &'a str,
}

impl<'a> ItemFields<'a> {
    pub fn lost(title: &'a str, category: &'a str, description: &'a str) -> Self {
        Self {
            item_type: "lost",
            title,
            category,
            description,
            location: "Central Park",
            date: "2025-02-01",
        }
    }

    pub fn found(title: &'a str, category: &'a str, description: &'a str) -> Self {
        Self {
            item_type: "found",
            ..Self::lost(title, category, description)
        }
    }
}

/// Submit a listing over multipart, optionally with an image part.
/// Returns status and raw body for the caller to assert on.
pub async fn submit_item(
    app: &Router,
    token: Option<&str>,
    fields: &ItemFields<'_>,
    image: Option<(&str, &str, &[u8])>,
) -> (StatusCode, Vec<u8>) {
    let boundary = generate_boundary();
    let mut body = Vec::new();

    push_text_field(&mut body, &boundary, "type", fields.item_type);
    push_text_field(&mut body, &boundary, "title", fields.title);
    push_text_field(&mut body, &boundary, "category", fields.category);
    push_text_field(&mut body, &boundary, "description", fields.description);
    push_text_field(&mut body, &boundary, "location", fields.location);
    push_text_field(&mut body, &boundary, "date", fields.date);
    if let Some((filename, content_type, data)) = image {
        push_file_field(&mut body, &boundary, "image", filename, content_type, data);
    }
    close_body(&mut body, &boundary);

    let mut request = Request::builder()
        .method(http::Method::POST)
        .uri("/items")
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        );
    if let Some(token) = token {
        request = request.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let response = app
        .clone()
        .oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let response_body = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();
    (status, response_body)
}

/// GET helper returning status and body, with an optional bearer token.
pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(http::Method::GET).uri(uri);
    if let Some(token) = token {
        request = request.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();
    (status, body)
}

/// JSON-bodied request helper for the non-multipart endpoints.
pub async fn send_json(
    app: &Router,
    method: http::Method,
    uri: &str,
    token: Option<&str>,
    payload: serde_json::Value,
) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(token) = token {
        request = request.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(payload.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();
    (status, body)
}
