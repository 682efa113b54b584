//! Protocol header names and request inspection helpers.

use http::{HeaderMap, HeaderName};

/// Header names that make up the wire protocol.
///
/// Header names are case-insensitive; `http` stores them lowercased, so
/// `x-inertia` here is the `X-Inertia` header on the wire.
pub mod header_names {
    use http::HeaderName;

    /// Marks an in-protocol navigation (request) and a data payload (response).
    pub const X_INERTIA: HeaderName = HeaderName::from_static("x-inertia");
    /// Client's cached asset version.
    pub const X_INERTIA_VERSION: HeaderName = HeaderName::from_static("x-inertia-version");
    /// Forced full-navigation target.
    pub const X_INERTIA_LOCATION: HeaderName = HeaderName::from_static("x-inertia-location");
    /// Target component for a partial reload.
    pub const X_INERTIA_PARTIAL_COMPONENT: HeaderName =
        HeaderName::from_static("x-inertia-partial-component");
    /// Comma-separated key allowlist for a partial reload.
    pub const X_INERTIA_PARTIAL_DATA: HeaderName =
        HeaderName::from_static("x-inertia-partial-data");
}

/// Get a header value as a string, treating non-UTF-8 values as absent.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Check whether the request was issued by the client-side router.
///
/// A header that is present but empty does not count.
pub fn is_inertia_request(headers: &HeaderMap) -> bool {
    header_str(headers, &header_names::X_INERTIA).is_some_and(|v| !v.is_empty())
}

/// Get the asset version the client advertised, if any.
pub fn client_version(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, &header_names::X_INERTIA_VERSION)
}
