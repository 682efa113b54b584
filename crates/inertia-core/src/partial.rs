//! Partial-reload key filtering.

use std::collections::BTreeSet;

use http::HeaderMap;

use crate::header::{header_names, header_str};

/// The set of prop keys a partial reload asked for.
///
/// An inactive filter lets every key through. A filter is only active when
/// the request sent a non-empty key list for the component currently being
/// rendered; an active filter with no usable keys lets nothing through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialFilter {
    active: bool,
    only: BTreeSet<String>,
}

impl PartialFilter {
    /// A filter that lets every key through.
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolve the filter from the raw header values.
    ///
    /// `only` is the comma-separated key list, `partial_component` the
    /// component the client targeted and `component` the one being rendered.
    /// A request addressed to another component yields an empty filter so
    /// that unrelated props are never dropped.
    pub fn resolve(only: Option<&str>, partial_component: Option<&str>, component: &str) -> Self {
        let only = match only {
            Some(only) if !only.is_empty() => only,
            _ => return Self::none(),
        };

        if partial_component != Some(component) {
            return Self::none();
        }

        Self {
            active: true,
            only: only
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Resolve the filter from request headers.
    pub fn from_headers(headers: &HeaderMap, component: &str) -> Self {
        Self::resolve(
            header_str(headers, &header_names::X_INERTIA_PARTIAL_DATA),
            header_str(headers, &header_names::X_INERTIA_PARTIAL_COMPONENT),
            component,
        )
    }

    /// Check whether a key survives the filter.
    pub fn allows(&self, key: &str) -> bool {
        !self.active || self.only.contains(key)
    }

    /// Check whether the filter lets every key through.
    pub fn is_empty(&self) -> bool {
        !self.active
    }

    /// The requested keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.only.iter().map(String::as_str)
    }
}
