//! # Authentication Module
//!
//! Handles JWT token issuance, validation and revocation, password
//! hashing, and the middleware securing authenticated endpoints.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::{Claims, JwtService};
pub use middleware::AuthMiddleware;
pub use models::{AuthPayload, AuthUser, LoginRequest, SignUpRequest, UserType};
