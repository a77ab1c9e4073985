//! # Clinica
//!
//! Clinic management backend and client.
//!
//! - `server` and `routes`: the Axum HTTP API (health, auth, consultas)
//! - `auth`: JWT issuing and validation, password hashing, the auth middleware
//! - `database`: repository traits and their in-memory stores
//! - `client`: typed HTTP client, persisted session and auth-state watcher
//! - `format`: CPF, phone and CEP masking plus field validation
//!
//! Two binaries are built from this crate: `clinica-server` and the
//! `clinica` command-line client.

pub mod auth;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod format;
pub mod logging;
pub mod response;
pub mod routes;
pub mod server;

#[cfg(test)]
mod test_support;
