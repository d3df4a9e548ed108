//! Authentication: credentials, tokens, and Google federation.

pub mod extract;
pub mod google;
pub mod handlers;
pub mod identity;
pub mod password;
pub mod routes;
pub mod service;
pub mod token;
pub mod types;

pub use extract::AuthUser;
pub use service::AuthService;
