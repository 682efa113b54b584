//! Process-wide compiled root template.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::engine::{CompiledTemplate, TemplateEngine};
use crate::error::TemplateError;
use crate::source::TemplateSource;

/// A compiled template shared between requests.
pub type SharedTemplate = Arc<Box<dyn CompiledTemplate>>;

/// Holds the compiled root template.
///
/// The slot is filled on first use and only emptied by [`TemplateCache::invalidate`].
/// Concurrent first uses may each compile; the last store wins.
#[derive(Default)]
pub struct TemplateCache {
    slot: ArcSwapOption<Box<dyn CompiledTemplate>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached template, if any.
    pub fn get(&self) -> Option<SharedTemplate> {
        self.slot.load_full()
    }

    /// Return the cached template or load and compile `source`.
    pub fn get_or_compile(
        &self,
        source: &TemplateSource,
        engine: &dyn TemplateEngine,
    ) -> Result<SharedTemplate, TemplateError> {
        if let Some(template) = self.get() {
            return Ok(template);
        }

        let name = source.name();
        let text = source.load()?;
        let compiled: SharedTemplate = Arc::new(engine.compile(&name, &text)?);
        tracing::debug!(template = %name, path = %source.path(), "Compiled root template");

        self.slot.store(Some(compiled.clone()));
        Ok(compiled)
    }

    /// Drop the cached template so the next request recompiles it.
    pub fn invalidate(&self) {
        if self.slot.swap(None).is_some() {
            tracing::debug!("Root template cache invalidated");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.slot.load().is_some()
    }
}

impl fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCache")
            .field("cached", &self.is_cached())
            .finish()
    }
}
