//! Item HTTP handlers.
//!
//! This module implements the item CRUD endpoints:
//! - POST /api/items - Create new item
//! - GET /api/items - List all items
//! - GET /api/items/:id - Get item by ID
//! - PUT /api/items/:id - Replace an item's name and description
//! - DELETE /api/items/:id - Delete an item
//!
//! Mutating handlers record an audit entry after the repository call
//! succeeds. Audit failures never change the response.

use crate::{
    error::AppError,
    handlers::AppState,
    models::{
        audit::AuditRecord,
        item::{CreatedResponse, Item, ItemRequest, MessageResponse},
    },
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

/// Turn a body extraction failure into a 400 with our error shape.
fn parse_body(payload: Result<Json<ItemRequest>, JsonRejection>) -> Result<ItemRequest, AppError> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

/// Turn a non-numeric id into a 400 with our error shape.
fn parse_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

/// Create a new item.
///
/// # Endpoint
///
/// `POST /api/items`
///
/// # Request Body
///
/// ```json
/// { "name": "Widget", "description": "A thing" }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: `{ "message": "Item created", "id": 1 }`
/// - **Error (400)**: Missing or blank field
/// - **Error (500)**: Database error
pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let fields = parse_body(payload)?.validate()?;

    let id = state.items.create(&fields).await?;
    state.audit.record(AuditRecord::created(id, fields.name()));

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Item created",
            id,
        }),
    ))
}

/// List all items.
///
/// # Response
///
/// - **Success (200 OK)**: Array of items in insertion order (may be empty)
///
/// ```json
/// [
///   { "id": 1, "name": "Widget", "description": "A thing" }
/// ]
/// ```
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, AppError> {
    let items = state.items.get_all().await?;
    Ok(Json(items))
}

/// Get a specific item by ID.
///
/// # Response
///
/// - **Success (200 OK)**: The item
/// - **Error (404)**: No item with this id
pub async fn get_item(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Item>, AppError> {
    let id = parse_id(path)?;
    let item = state.items.get_by_id(id).await?;
    Ok(Json(item))
}

/// Replace an item's name and description.
///
/// Succeeds with 200 even when no item has this id; nothing is created
/// in that case.
pub async fn update_item(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(path)?;
    let fields = parse_body(payload)?.validate()?;

    state.items.update(id, &fields).await?;
    state.audit.record(AuditRecord::updated(id, fields.name()));

    Ok(Json(MessageResponse {
        message: "Item updated",
    }))
}

/// Delete an item.
///
/// Deleting an id that does not exist is still a 200.
pub async fn delete_item(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(path)?;
    state.items.delete(id).await?;
    state.audit.record(AuditRecord::deleted(id));

    Ok(Json(MessageResponse {
        message: "Item deleted",
    }))
}
