//! Process-wide shared state.

use std::sync::Arc;

use inertia_core::{Props, ViewData};
use inertia_render::{FuncRegistry, TemplateFn};
use serde_json::Value;

/// Values registered once and read on every request.
///
/// Published as an immutable snapshot; registration builds a new snapshot
/// and swaps it in, so requests in flight keep the one they started with.
#[derive(Debug, Clone)]
pub struct SharedState {
    props: Props,
    view_data: ViewData,
    funcs: FuncRegistry,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            props: Props::new(),
            view_data: ViewData::new(),
            funcs: FuncRegistry::with_builtins(),
        }
    }
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Props merged into every page before request and handler props.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// View data copied into every document context.
    pub fn view_data(&self) -> &ViewData {
        &self.view_data
    }

    /// Functions available to the root template.
    pub fn funcs(&self) -> &FuncRegistry {
        &self.funcs
    }

    pub(crate) fn with_prop(&self, key: &str, value: &Value) -> Self {
        let mut next = self.clone();
        next.props.insert(key.to_string(), value.clone());
        next
    }

    pub(crate) fn with_view_data(&self, key: &str, value: &Value) -> Self {
        let mut next = self.clone();
        next.view_data.insert(key.to_string(), value.clone());
        next
    }

    pub(crate) fn with_func(&self, name: &str, func: &Arc<TemplateFn>) -> Self {
        let mut next = self.clone();
        next.funcs.insert_shared(name, func.clone());
        next
    }
}
