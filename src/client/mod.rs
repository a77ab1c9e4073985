//! Client side of the clinic API: HTTP access, session storage and the
//! auth-state watcher used by the CLI.

pub mod api;
pub mod auth;
pub mod session;
pub mod watcher;

pub use api::{ApiClient, ApiError, ApiResult};
pub use auth::{AuthClient, AuthError, AuthResult};
pub use session::{FileTokenStore, MemoryTokenStore, Session, SessionError, SessionEvent, TokenStore};
pub use watcher::AuthSubscription;
