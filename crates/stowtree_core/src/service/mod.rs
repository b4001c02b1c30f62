//! Core use-case services.
//!
//! # Responsibility
//! - Own the application state and orchestrate source calls into
//!   use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod location;
pub mod state;
pub mod storage_service;
