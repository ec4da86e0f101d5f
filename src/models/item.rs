//! Item data models and API request/response types.
//!
//! This module defines:
//! - `Item`: Database entity representing a stored item
//! - `ItemRequest`: Request body for creating and updating items
//! - `ItemFields`: Validated name/description pair handed to the repository
//! - `CreatedResponse` / `MessageResponse`: Bodies returned by mutating endpoints

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Represents an item record from the database.
///
/// # Database Table
///
/// Maps to the `items` table. The `id` is assigned by the database on
/// insert and never changes afterwards.
///
/// # JSON Example
///
/// ```json
/// { "id": 1, "name": "Widget", "description": "A thing" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// Request body for `POST /api/items` and `PUT /api/items/{id}`.
///
/// Both fields are optional at the serde level so a missing field surfaces
/// as a 400 from [`ItemRequest::validate`] instead of a deserialization
/// rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ItemRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// A name/description pair that passed validation.
///
/// Only constructible through [`ItemRequest::validate`] or [`ItemFields::new`],
/// so the repository never sees blank fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    name: String,
    description: String,
}

impl ItemFields {
    /// # Errors
    ///
    /// `InvalidRequest` when either value is empty or whitespace only.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self, AppError> {
        let name = name.into();
        let description = description.into();

        if name.trim().is_empty() || description.trim().is_empty() {
            return Err(AppError::InvalidRequest("Invalid data".to_string()));
        }

        Ok(Self { name, description })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl ItemRequest {
    /// Check required fields and turn the request into [`ItemFields`].
    pub fn validate(self) -> Result<ItemFields, AppError> {
        ItemFields::new(
            self.name.unwrap_or_default(),
            self.description.unwrap_or_default(),
        )
    }
}

/// Response body for `POST /api/items` (201 Created).
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: i32,
}

/// Response body for update and delete.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
