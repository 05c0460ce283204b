//! Authentication
//!
//! - [`tokens`]: OneDrive OAuth access token acquisition and refresh
//! - [`protected`]: `.password` guarded folders

pub mod protected;
pub mod tokens;

pub use protected::{auth_token_path, check_auth_route, hash_token, AuthCheck};
pub use tokens::{OAuthConfig, TokenManager, TokenResponse};
