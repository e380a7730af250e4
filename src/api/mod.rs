//! HTTP API module.
//!
//! Exposes the handler modules for sessions, user administration, permission
//! administration, content bindings, bootstrap, and health.
pub mod content;
pub mod error;
pub mod openapi;
pub mod permissions;
pub mod session;
pub mod setup;
pub mod system;
pub mod types;
pub mod users;
