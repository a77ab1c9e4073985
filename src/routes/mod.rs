// # Routes Module
//
// HTTP route handlers for the clinic server, one submodule per API area.
// Each area exposes a `create_*_routes` function that `server.rs` merges
// into the main router.

/// Health check endpoint
pub mod health;

/// Sign-up, login, logout and current-user endpoints
pub mod auth;

/// Appointment endpoints
pub mod consultas;

/// JSON and path extractors that reject with the API error envelope
pub mod extract;

/// Catch-all for unmatched routes
pub mod fallback;
