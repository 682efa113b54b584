//! Sidecar render result.

use serde::{Deserialize, Serialize};

/// Markup produced by the sidecar for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsrResponse {
    /// Fragments to place in the document head.
    #[serde(default)]
    pub head: Vec<String>,
    /// Markup to place in the document body.
    #[serde(default)]
    pub body: String,
}

impl SsrResponse {
    /// Create a render result.
    pub fn new(head: Vec<String>, body: impl Into<String>) -> Self {
        Self {
            head,
            body: body.into(),
        }
    }

    /// Head fragments joined with newlines.
    pub fn head_html(&self) -> String {
        self.head.join("\n")
    }
}
