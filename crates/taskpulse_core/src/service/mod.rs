//! Use-case services over the task store.
//!
//! # Responsibility
//! - Expose CRUD and reporting entry points for the HTTP and CLI layers.
//! - Keep transports decoupled from storage and scheduling details.

pub mod stats;
pub mod task_service;
