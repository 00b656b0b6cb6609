//! Request handlers for the client API.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::error::ApiError;
use super::AppState;
use crate::model::{Client, ClientId, ClientNotes};

/// Body of `PUT /api/clients/{id}/notes`.
#[derive(Debug, Deserialize)]
pub(crate) struct NotesPayload {
    #[serde(default)]
    notes: String,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "clients": state.store.count().await,
    }))
}

pub(crate) async fn list_clients(State(state): State<AppState>) -> Json<Vec<Client>> {
    Json(state.store.get_all_clients().await)
}

pub(crate) async fn create_client(
    State(state): State<AppState>,
    body: Result<Json<Client>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    const FAILED: &str = "Failed to create client";

    let Json(client) = body?;
    state
        .check_mobile_number(&client)
        .map_err(|e| ApiError::from_error(&e, FAILED))?;

    let client = state
        .store
        .add_client(client)
        .await
        .map_err(|e| ApiError::from_error(&e, FAILED))?;

    debug!("POST /api/clients -> {}", client.id);
    Ok((StatusCode::CREATED, Json(client)))
}

pub(crate) async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Client>, ApiError> {
    let id = ClientId::from(id);
    state.store.get_client(&id).await.map(Json).ok_or_else(|| {
        ApiError::from_error(
            &crate::Error::client_not_found(id.as_str()),
            "Failed to load client",
        )
    })
}

/// `GET /client/clients/{id}.json`: the per-client file path.
pub(crate) async fn get_client_file(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Json<Client>, ApiError> {
    let Some(id) = file.strip_suffix(".json") else {
        return Err(ApiError::route_not_found());
    };
    get_client(State(state), Path(id.to_string())).await
}

pub(crate) async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Client>, JsonRejection>,
) -> Result<Json<Client>, ApiError> {
    const FAILED: &str = "Failed to update client";

    let Json(client) = body?;
    state
        .check_mobile_number(&client)
        .map_err(|e| ApiError::from_error(&e, FAILED))?;

    let client = state
        .store
        .update_client(&ClientId::from(id), client)
        .await
        .map_err(|e| ApiError::from_error(&e, FAILED))?;

    Ok(Json(client))
}

pub(crate) async fn get_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClientNotes>, ApiError> {
    state
        .store
        .get_notes(&ClientId::from(id))
        .await
        .map(Json)
        .map_err(|e| ApiError::from_error(&e, "Failed to load notes"))
}

pub(crate) async fn save_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NotesPayload>, JsonRejection>,
) -> Result<Json<ClientNotes>, ApiError> {
    let Json(payload) = body?;
    state
        .store
        .save_notes(&ClientId::from(id), payload.notes)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_error(&e, "Failed to save notes"))
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::route_not_found()
}
