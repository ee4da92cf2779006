//! API module for shared HTTP API functionality
//!
//! Contains ONLY pure functions and shared types; the server wraps them with
//! axum-specific extractors and middleware.

pub mod auth;
pub mod types;

pub use auth::{
    generate_session_token, hash_password, is_valid_email, verify_password,
};
pub use types::{ErrorResponse, MessageResponse};
