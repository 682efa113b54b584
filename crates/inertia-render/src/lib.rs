//! Root template loading, caching and helper functions.
//!
//! The negotiation engine hands the document context to a template engine
//! through the traits defined here:
//! - `TemplateSource` / `TemplateFs` - Where the root template comes from
//! - `TemplateEngine` / `CompiledTemplate` - Compile once, execute per request
//! - `BasicEngine` - A small built-in engine
//! - `FuncRegistry` - Helper functions (`marshal`, `raw`, `lines`, ...)
//! - `TemplateCache` - The process-wide compiled template

mod cache;
mod engine;
mod error;
mod funcs;
mod source;

pub use cache::*;
pub use engine::*;
pub use error::*;
pub use funcs::*;
pub use source::*;
