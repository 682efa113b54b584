//! Protocol primitives for server-driven SPA page negotiation.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Page` - The navigation payload sent to the client-side router
//! - `header_names` - Wire-level header names
//! - `RequestScope` - Per-request contextual props and view data
//! - `PartialFilter` - Partial-reload key filtering
//! - `InertiaConfig` - Engine configuration

mod config;
mod context;
mod error;
mod header;
mod page;
mod partial;

pub use config::*;
pub use context::*;
pub use error::*;
pub use header::*;
pub use page::*;
pub use partial::*;
