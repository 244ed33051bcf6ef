//! HTTP handlers for model management and record CRUD.

pub mod data;
pub mod models;
