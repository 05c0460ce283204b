//! odindex - OneDrive file index gateway
//!
//! Serves a OneDrive folder tree (through Microsoft Graph) as a browsable,
//! shareable file index over plain HTTP.
//!
//! ## Services
//!
//! - **Routes**: folder listing, item lookup, search, thumbnails and raw file
//!   redirect/proxy under `/api/*`
//! - **Store**: pluggable key-value backends holding the OAuth token pair
//! - **Auth**: token refresh and password-protected folders
//! - **Preview**: descriptors for the video, EPUB, office and PDF viewers

pub mod auth;
pub mod config;
pub mod graph;
pub mod logging;
pub mod preview;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{IndexError, Result};
