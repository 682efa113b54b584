//! Navigation payload.

use http::Uri;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resolved page properties keyed by name.
pub type Props = Map<String, Value>;

/// Data handed to the root template when rendering a full document.
pub type ViewData = Map<String, Value>;

/// The payload describing which client view to show and with what data.
///
/// Serialized as `{component, props, url, version}` for data-payload responses,
/// inlined into the root template on first load, and posted to the SSR sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Client view identifier (e.g., "users/index").
    pub component: String,
    /// Props surviving the active partial filter.
    pub props: Props,
    /// The request URI as received.
    pub url: String,
    /// The engine's configured asset version.
    pub version: String,
}

impl Page {
    /// Create a page with no props.
    pub fn new(
        component: impl Into<String>,
        url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            props: Props::new(),
            url: url.into(),
            version: version.into(),
        }
    }

    /// Get a prop by key.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Serialize to the data-payload wire format.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from the data-payload wire format.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// The request target exactly as it appeared on the request line.
///
/// Origin-form URIs are returned verbatim; absolute-form URIs are reduced to
/// their path and query.
pub fn request_url(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}
