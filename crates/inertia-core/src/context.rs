//! Request-scoped contextual props and view data.

use std::time::{Duration, Instant};

use http::Extensions;
use serde_json::Value;

use crate::error::ScopeError;
use crate::page::{Props, ViewData};

/// Per-request state carried in the request's extensions.
///
/// Middleware and handlers further up the chain write props and view data
/// here; the engine reads them when the page is rendered. Nothing in a scope
/// is ever visible to another request.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    props: Option<Props>,
    view_data: Option<ViewData>,
    deadline: Option<Instant>,
}

impl RequestScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the scope attached to a request, if any.
    pub fn get(extensions: &Extensions) -> Option<&RequestScope> {
        extensions.get::<RequestScope>()
    }

    /// Get the scope attached to a request, attaching an empty one first if needed.
    pub fn get_or_insert(extensions: &mut Extensions) -> &mut RequestScope {
        extensions.get_or_insert_default::<RequestScope>()
    }

    /// Add a contextual prop, creating the prop map on first write.
    pub fn insert_prop(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.props
            .get_or_insert_with(Props::new)
            .insert(key.into(), value.into());
    }

    /// Add contextual view data, creating the map on first write.
    pub fn insert_view_data(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.view_data
            .get_or_insert_with(ViewData::new)
            .insert(key.into(), value.into());
    }

    /// Merge an untyped JSON object into the contextual props.
    ///
    /// Fails without modifying the scope if `value` is not an object.
    pub fn merge_props_value(&mut self, value: Value) -> Result<(), ScopeError> {
        match value {
            Value::Object(map) => {
                self.props.get_or_insert_with(Props::new).extend(map);
                Ok(())
            }
            _ => Err(ScopeError::MalformedContextProps),
        }
    }

    /// Merge an untyped JSON object into the contextual view data.
    ///
    /// Fails without modifying the scope if `value` is not an object.
    pub fn merge_view_data_value(&mut self, value: Value) -> Result<(), ScopeError> {
        match value {
            Value::Object(map) => {
                self.view_data.get_or_insert_with(ViewData::new).extend(map);
                Ok(())
            }
            _ => Err(ScopeError::MalformedContextViewData),
        }
    }

    /// Set the point in time by which the response must be produced.
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Builder form of [`RequestScope::set_deadline`].
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Contextual props, if any were written.
    pub fn props(&self) -> Option<&Props> {
        self.props.as_ref()
    }

    /// Contextual view data, if any was written.
    pub fn view_data(&self) -> Option<&ViewData> {
        self.view_data.as_ref()
    }

    /// The caller-supplied deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline.
    ///
    /// Returns `Some(Duration::ZERO)` once the deadline has passed and `None`
    /// when no deadline was set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_scope_is_empty() {
        let scope = RequestScope::new();
        assert!(scope.props().is_none());
        assert!(scope.view_data().is_none());
        assert!(scope.deadline().is_none());
        assert!(scope.remaining().is_none());
    }

    #[test]
    fn test_insert_prop_creates_then_extends() {
        let mut scope = RequestScope::new();
        scope.insert_prop("user", json!({"id": 1}));
        assert_eq!(scope.props().unwrap().len(), 1);

        scope.insert_prop("flash", "saved");
        scope.insert_prop("user", json!({"id": 2}));

        let props = scope.props().unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props["user"], json!({"id": 2}));
        assert_eq!(props["flash"], json!("saved"));
    }

    #[test]
    fn test_insert_view_data_is_independent_of_props() {
        let mut scope = RequestScope::new();
        scope.insert_view_data("title", "Dashboard");

        assert!(scope.props().is_none());
        assert_eq!(scope.view_data().unwrap()["title"], json!("Dashboard"));
    }

    // === Extensions Tests ===

    #[test]
    fn test_get_or_insert_attaches_once() {
        let mut extensions = Extensions::new();
        assert!(RequestScope::get(&extensions).is_none());

        RequestScope::get_or_insert(&mut extensions).insert_prop("a", 1);
        RequestScope::get_or_insert(&mut extensions).insert_prop("b", 2);

        let scope = RequestScope::get(&extensions).unwrap();
        assert_eq!(scope.props().unwrap().len(), 2);
    }

    // === Untyped Merge Tests ===

    #[test]
    fn test_merge_props_value_object() {
        let mut scope = RequestScope::new();
        scope.insert_prop("a", 1);
        scope
            .merge_props_value(json!({"a": 10, "b": 20}))
            .unwrap();

        let props = scope.props().unwrap();
        assert_eq!(props["a"], json!(10));
        assert_eq!(props["b"], json!(20));
    }

    #[test]
    fn test_merge_props_value_rejects_non_object() {
        let mut scope = RequestScope::new();
        let err = scope.merge_props_value(json!(["a"])).unwrap_err();

        assert_eq!(err, ScopeError::MalformedContextProps);
        assert!(scope.props().is_none());
    }

    #[test]
    fn test_merge_view_data_value_rejects_non_object() {
        let mut scope = RequestScope::new();
        let err = scope.merge_view_data_value(json!("title")).unwrap_err();

        assert_eq!(err, ScopeError::MalformedContextViewData);
        assert_eq!(
            err.to_string(),
            "could not convert context view data to map"
        );
    }

    // === Deadline Tests ===

    #[test]
    fn test_remaining_before_deadline() {
        let scope = RequestScope::new().with_deadline(Instant::now() + Duration::from_secs(30));
        let remaining = scope.remaining().unwrap();
        assert!(remaining > Duration::from_secs(20));
    }

    #[test]
    fn test_remaining_after_deadline_is_zero() {
        let mut scope = RequestScope::new();
        scope.set_deadline(Instant::now() - Duration::from_millis(5));
        assert_eq!(scope.remaining(), Some(Duration::ZERO));
    }
}
