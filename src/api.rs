use std::sync::PoisonError;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::spawn;
use tracing::info;

use crate::{
    app_state::AppState,
    node::Node,
    report::Report,
    source::{self, SourceOptions, SourceSummary},
    store::NodeStore,
    validate,
};

// --- Payloads ---

#[derive(Deserialize)]
pub struct NodesQuery {
    #[serde(rename = "type")]
    node_type: String,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/nodes", get(nodes_by_type_handler))
        .route("/api/nodes/:id", get(node_handler))
        .route("/api/schema", get(schema_handler))
        .route("/api/options-schema", get(options_schema_handler))
        .route("/api/reports", get(reports_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

/// Pasada completa: descarta los nodos anteriores y los reconstruye.
pub async fn run_source_pass(state: &AppState) -> SourceSummary {
    {
        let mut status = state.status.lock().unwrap_or_else(PoisonError::into_inner);
        status.is_busy = true;
        status.message = "Descargando datos de Guesty...".to_string();
    }

    state.store.clear();
    state.reporter.clear();
    let summary = source::source_nodes(
        state.client.as_ref(),
        state.store.as_ref(),
        state.files.as_ref(),
        state.reporter.as_ref(),
        &SourceOptions::from_config(&state.config),
    )
    .await;

    let mut status = state.status.lock().unwrap_or_else(PoisonError::into_inner);
    status.is_busy = false;
    status.message = format!("¡Datos actualizados! {summary}");
    status.last_summary = Some(summary.clone());
    summary
}

// --- Handlers ---

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    let status = state
        .status
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Json(json!({ "status": status, "nodes": state.store.len() }))
}

#[axum::debug_handler]
async fn nodes_by_type_handler(
    State(state): State<AppState>,
    Query(params): Query<NodesQuery>,
) -> Json<Vec<Node>> {
    Json(state.store.nodes_by_type(&params.node_type))
}

#[axum::debug_handler]
async fn node_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Node>, (StatusCode, Json<Value>)> {
    state.store.get_node(&id).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No existe el nodo {id}") })),
        )
    })
}

#[axum::debug_handler]
async fn schema_handler(State(state): State<AppState>) -> String {
    state.store.type_defs().join("\n\n")
}

#[axum::debug_handler]
async fn options_schema_handler() -> Json<Value> {
    Json(validate::options_schema())
}

#[axum::debug_handler]
async fn reports_handler(State(state): State<AppState>) -> Json<Vec<Report>> {
    Json(state.reporter.reports())
}

#[axum::debug_handler]
async fn refresh_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    {
        // Comprobar y marcar bajo el mismo candado.
        let mut status = state.status.lock().unwrap_or_else(PoisonError::into_inner);
        if status.is_busy {
            return Err((
                StatusCode::CONFLICT,
                Json(json!({ "error": "Ya hay una actualización en curso." })),
            ));
        }
        status.is_busy = true;
        status.message = "Actualización programada.".to_string();
    }

    spawn(async move {
        run_source_pass(&state).await;
    });

    Ok(StatusCode::ACCEPTED)
}

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state
        .shutdown_sender
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
    {
        let _ = sender.send(());
    }
    StatusCode::OK
}
