//! Mock de la API de Guesty servido con axum, compartido por los tests de
//! integración.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use guesty_source::{
    auth::{basic_auth_token, Credentials},
    client::{ClientSettings, GuestyClient},
    config::ApiEndpoint,
    images::{RemoteFileFactory, RemoteFileRequest, FILE_NODE_TYPE},
    models::FileNode,
    node::create_node_id,
};
use serde_json::{json, Value};

pub const KEY: &str = "user API key";
pub const SECRET: &str = "user API secret";

#[derive(Clone)]
pub struct MockGuesty {
    pub listings: Value,
    pub reviews: Value,
    pub reviews_status: StatusCode,
    /// Latencia añadida a `/listings`.
    pub delay: Duration,
    pub seen_fields: Arc<Mutex<Vec<String>>>,
    pub seen_account_ids: Arc<Mutex<Vec<String>>>,
}

impl MockGuesty {
    pub fn new(listings: Value, reviews: Value) -> Self {
        Self {
            listings,
            reviews,
            reviews_status: StatusCode::OK,
            delay: Duration::ZERO,
            seen_fields: Arc::new(Mutex::new(Vec::new())),
            seen_account_ids: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Exige las dos cabeceras que la API real espera en cada petición.
fn check_headers(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Basic {}", basic_auth_token(KEY, SECRET));
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let json_content = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "application/json");
    if !json_content {
        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
    Ok(())
}

fn record_account(mock: &MockGuesty, params: &HashMap<String, String>) {
    if let Some(account_id) = params.get("accountId") {
        mock.seen_account_ids.lock().unwrap().push(account_id.clone());
    }
}

async fn listings(
    State(mock): State<MockGuesty>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(status) = check_headers(&headers) {
        return status.into_response();
    }
    record_account(&mock, &params);
    if let Some(fields) = params.get("fields") {
        mock.seen_fields.lock().unwrap().push(fields.clone());
    }
    if !mock.delay.is_zero() {
        tokio::time::sleep(mock.delay).await;
    }
    Json(json!({ "results": mock.listings })).into_response()
}

async fn reviews(
    State(mock): State<MockGuesty>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(status) = check_headers(&headers) {
        return status.into_response();
    }
    record_account(&mock, &params);
    if mock.reviews_status != StatusCode::OK {
        return mock.reviews_status.into_response();
    }
    Json(json!({ "data": mock.reviews })).into_response()
}

async fn image(Path(name): Path<String>) -> Response {
    if name.starts_with("missing") {
        return StatusCode::NOT_FOUND.into_response();
    }
    ([(header::CONTENT_TYPE, "image/jpeg")], name.into_bytes()).into_response()
}

pub async fn serve_router(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn serve(mock: MockGuesty) -> SocketAddr {
    let app = Router::new()
        .route("/api/v2/listings", get(listings))
        .route("/api/v2/reviews-service/api/reviews", get(reviews))
        .route("/img/:name", get(image))
        .with_state(mock);
    serve_router(app).await
}

pub fn endpoint(addr: SocketAddr) -> ApiEndpoint {
    ApiEndpoint::new(&format!("http://{addr}/api/v2"), Duration::from_secs(5)).unwrap()
}

pub fn client_with(endpoint: ApiEndpoint, key: &str, secret: &str) -> GuestyClient {
    GuestyClient::new(&ClientSettings {
        endpoint,
        credentials: Credentials::new(key, secret),
    })
    .unwrap()
}

pub fn client(addr: SocketAddr, key: &str, secret: &str) -> GuestyClient {
    client_with(endpoint(addr), key, secret)
}

/// Fábrica que no descarga nada: crea un `FileNode` por URL.
pub struct StubFiles;

impl RemoteFileFactory for StubFiles {
    async fn create_remote_file_node(&self, request: RemoteFileRequest) -> anyhow::Result<Option<FileNode>> {
        Ok(Some(FileNode {
            id: create_node_id(FILE_NODE_TYPE, &request.url),
            url: request.url,
            parent_id: request.parent_node_id,
            path: "/dev/null".into(),
            filename: "stub.jpg".into(),
            size_bytes: 0,
            mime_type: None,
            content_digest: "stub".into(),
        }))
    }
}

pub fn sample_listings() -> Value {
    json!([
        {
            "_id": "L1",
            "title": "Ático con vistas",
            "bedrooms": 2,
            "pictures": [
                { "_id": "p1", "original": "https://img.example/1.jpg" },
                { "_id": "p2", "original": "https://img.example/2.jpg" }
            ]
        },
        { "_id": "L2", "title": "Estudio", "bedrooms": 0, "pictures": null }
    ])
}

pub fn sample_reviews() -> Value {
    json!([
        { "_id": "R1", "channelId": "airbnb2", "listingId": "L1", "rawReview": { "overall_rating": 5 } },
        { "_id": "L2", "channelId": "airbnb2", "listingId": "L2" }
    ])
}
