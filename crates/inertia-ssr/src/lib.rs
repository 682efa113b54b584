//! Client for the server-side rendering sidecar.
//!
//! This crate provides:
//! - `SsrRenderer` - The render contract (page in, head/body out)
//! - `HttpSsrRenderer` - The HTTP implementation talking to the sidecar
//! - `SsrTimeouts` - Connect and total time limits
//! - `SsrError` - Connectivity, status and decode failures

mod client;
mod error;
mod response;
mod timeout;

pub use client::*;
pub use error::*;
pub use response::*;
pub use timeout::*;
