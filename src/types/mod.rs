//! Data types for Yacode requests.
//!
//! - Device endpoints
//! - Dynamic print content

pub mod content;
pub mod endpoint;

pub use content::{DynamicContent, TEXT_AND_IMAGE};
pub use endpoint::{DEFAULT_PORT, Endpoint};
