use std::{collections::BTreeMap, collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
}

/// Body returned by the echo routes: what the server saw of the request.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// Error payload for non-200 responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", get(echo_query).post(echo_body))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item))
        .route("/status/{code}", get(status))
        .route("/slow", get(slow))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn echo_query(Query(query): Query<BTreeMap<String, String>>) -> Json<Echo> {
    Json(Echo {
        method: "GET".to_string(),
        query,
        ..Echo::default()
    })
}

async fn echo_body(headers: HeaderMap, body: String) -> Result<Json<Echo>, (StatusCode, Json<ErrorBody>)> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = if body.is_empty() {
        None
    } else {
        let value = serde_json::from_str(&body).map_err(|e| bad_request(e.to_string()))?;
        Some(value)
    };
    Ok(Json(Echo {
        method: "POST".to_string(),
        query: BTreeMap::new(),
        content_type,
        body,
    }))
}

#[derive(Deserialize)]
struct ListFilter {
    name: Option<String>,
}

async fn list_items(State(db): State<Db>, Query(filter): Query<ListFilter>) -> Json<Vec<Item>> {
    let items = db.read().await;
    let mut found: Vec<Item> = items
        .values()
        .filter(|item| filter.name.as_deref().map_or(true, |name| item.name == name))
        .cloned()
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Json(found)
}

// 200 rather than 201: restfully services only accept 200.
async fn create_item(
    State(db): State<Db>,
    body: String,
) -> Result<Json<Item>, (StatusCode, Json<ErrorBody>)> {
    let input: CreateItem = serde_json::from_str(&body).map_err(|e| bad_request(e.to_string()))?;
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        quantity: input.quantity,
    };
    db.write().await.insert(item.id, item.clone());
    Ok(Json(item))
}

async fn get_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, (StatusCode, Json<ErrorBody>)> {
    let items = db.read().await;
    items.get(&id).cloned().map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: format!("item {id} not found"),
            }),
        )
    })
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let reason = status.canonical_reason().unwrap_or("unknown").to_string();
    (status, reason)
}

#[derive(Deserialize)]
struct SlowParams {
    #[serde(default)]
    ms: u64,
}

async fn slow(Query(params): Query<SlowParams>) -> Json<Echo> {
    tokio::time::sleep(Duration::from_millis(params.ms)).await;
    Json(Echo {
        method: "GET".to_string(),
        ..Echo::default()
    })
}

fn bad_request(message: String) -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message }))
}
