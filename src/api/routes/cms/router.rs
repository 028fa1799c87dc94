//! Router for editing portfolio content. Every request needs a valid
//! admin session token in the `x-admin-token` header.

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
};
use chrono::Utc;
use serde_json::{Map, Value};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::db::{delete_row, insert_row, is_constraint_violation, list_rows, update_row};
use super::public::{ADMIN_TOKEN_HEADER, DataResponse};
use super::resource::{self, Resource};
use crate::api::public::{ApiError, INVALID_BODY};
use crate::api::routes::admin::db::{SessionStatus, verify_session};
use crate::api::routes::admin::public::SuccessResponse;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Check the session token, then the resource name.
async fn authorize(
    state: &SharedState,
    headers: &HeaderMap,
    name: &str,
) -> Result<(Connection, &'static Resource), ApiError> {
    let db = state.read().expect("Unable to read shared state").db.clone();

    let token = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());
    tracing::info!("CMS request for {} with token: {}", name, token.is_some());

    let Some(token) = token else {
        return Err(ApiError::unauthorized("Unauthorized"));
    };
    let SessionStatus::Valid(_) = verify_session(&db, token, Utc::now()).await? else {
        return Err(ApiError::unauthorized("Unauthorized"));
    };

    let Some(resource) = resource::find(name) else {
        return Err(ApiError::bad_request("Invalid resource"));
    };

    Ok((db, resource))
}

// Bodies are read after the session check so an unauthenticated
// request is always a 401
fn parse_fields(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        _ => Err(ApiError::bad_request(INVALID_BODY)),
    }
}

fn row_id(fields: &Map<String, Value>) -> Option<&str> {
    fields
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

fn write_error(err: anyhow::Error) -> ApiError {
    if is_constraint_violation(&err) {
        tracing::info!("Rejected CMS write: {:#}", err);
        return ApiError::bad_request("Request conflicts with existing content");
    }
    ApiError::from(err)
}

async fn list(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DataResponse<Vec<Value>>>, ApiError> {
    let (db, resource) = authorize(&state, &headers, &name).await?;
    let data = list_rows(&db, resource).await?;
    Ok(Json(DataResponse { data }))
}

async fn create(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<DataResponse<Value>>), ApiError> {
    let (db, resource) = authorize(&state, &headers, &name).await?;
    let fields = parse_fields(&body)?;
    let values = resource
        .bind(&fields, true)
        .map_err(|msg| ApiError::bad_request(&msg))?;

    let id = row_id(&fields)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let data = insert_row(&db, resource, &id, values)
        .await
        .map_err(write_error)?;

    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

async fn update(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DataResponse<Value>>, ApiError> {
    let (db, resource) = authorize(&state, &headers, &name).await?;
    let fields = parse_fields(&body)?;
    let Some(id) = row_id(&fields) else {
        return Err(ApiError::bad_request("ID is required for update"));
    };
    let values = resource
        .bind(&fields, false)
        .map_err(|msg| ApiError::bad_request(&msg))?;

    let Some(data) = update_row(&db, resource, id, values)
        .await
        .map_err(write_error)?
    else {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "Record not found"));
    };

    Ok(Json(DataResponse { data }))
}

async fn remove(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (db, resource) = authorize(&state, &headers, &name).await?;
    let fields = parse_fields(&body)?;
    let Some(id) = row_id(&fields) else {
        return Err(ApiError::bad_request("ID is required for delete"));
    };

    delete_row(&db, resource, id).await?;
    tracing::info!("Deleted {} {}", resource.name, id);

    Ok(Json(SuccessResponse::new(None)))
}

/// Create the content router
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/{resource}",
        get(list).post(create).put(update).delete(remove),
    )
}
