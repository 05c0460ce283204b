//! Shared types for odindex

pub mod error;

pub use error::{IndexError, Result, INTERNAL_SERVER_ERROR};
