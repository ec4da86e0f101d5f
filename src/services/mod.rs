//! Storage and side-channel services used by the HTTP handlers.

pub mod audit_service;
pub mod item_repository;
