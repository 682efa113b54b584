//! Template error types.

use thiserror::Error;

/// Errors that can occur while loading, compiling or executing a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Failed to read the template source.
    #[error("Failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The template source is malformed.
    #[error("Template {template}: {message}")]
    Parse { template: String, message: String },

    /// The template called a function that is not registered.
    #[error("Template {template}: function '{name}' not defined")]
    UnknownFunction { template: String, name: String },

    /// A helper function failed.
    #[error("Template {template}: function '{name}' failed: {message}")]
    Function {
        template: String,
        name: String,
        message: String,
    },
}
