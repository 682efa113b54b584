//! Page negotiation for single-page front ends.
//!
//! This crate provides:
//! - `Inertia` - Builds pages from layered props and answers with JSON or HTML
//! - `SharedState` - Process-wide props, view data and template functions
//! - `VersionGuardLayer` - Forces a full reload when client assets are stale
//! - `InertiaError` - Everything that can fail while rendering

mod engine;
mod error;
mod middleware;
mod store;

pub use engine::*;
pub use error::*;
pub use middleware::*;
pub use store::*;
