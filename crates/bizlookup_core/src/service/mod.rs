//! Use-case services built on the directory and history contracts.
//!
//! # Responsibility
//! - Orchestrate repository calls into search, history and profile APIs.
//! - Keep callers decoupled from the selected storage backend.

pub mod history_service;
pub mod profile_service;
pub mod search_service;
