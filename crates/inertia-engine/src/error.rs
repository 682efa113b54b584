//! Negotiation error types.

use inertia_core::ScopeError;
use inertia_render::TemplateError;
use inertia_ssr::SsrError;
use thiserror::Error;

/// Errors that abort a response.
///
/// Nothing is written when one of these is returned; the caller picks the
/// HTTP-level failure response.
#[derive(Error, Debug)]
pub enum InertiaError {
    /// The configuration was rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Request-scoped props or view data had the wrong shape.
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// The page or document context could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The SSR sidecar call failed.
    #[error("SSR failed: {0}")]
    Ssr(#[from] SsrError),

    /// The root template could not be loaded, compiled or executed.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// The response could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    /// A header value contained characters HTTP does not allow.
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
}

impl InertiaError {
    /// Check if the failure came from the SSR sidecar.
    ///
    /// Hosts can use this to fall back to client-side rendering.
    pub fn is_ssr(&self) -> bool {
        matches!(self, Self::Ssr(_))
    }

    /// Check if the failure came from the root template.
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template(_))
    }
}
