//! Helper functions available to the root template.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// What a helper function produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Trusted markup, written to the document as-is.
    Html(String),
    /// Plain text, escaped before it is written.
    Text(String),
}

/// A helper callable from the template as `{{ name arg }}`.
///
/// Errors are reported as messages and wrapped with the template and
/// function name by the engine.
pub type TemplateFn = dyn Fn(&Value) -> Result<Output, String> + Send + Sync;

/// Named helper functions.
#[derive(Clone, Default)]
pub struct FuncRegistry {
    funcs: HashMap<String, Arc<TemplateFn>>,
}

impl FuncRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding `marshal`, `raw` and `lines`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert("marshal", |v: &Value| {
            marshal(v).map(Output::Html).map_err(|e| e.to_string())
        });
        registry.insert("raw", |v: &Value| raw(v).map(Output::Html));
        registry.insert("lines", |v: &Value| raw(v).map(Output::Html));
        registry
    }

    /// Register a function, replacing any function of the same name.
    pub fn insert<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&Value) -> Result<Output, String> + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
    }

    /// Register an already shared function.
    pub fn insert_shared(&mut self, name: impl Into<String>, func: Arc<TemplateFn>) {
        self.funcs.insert(name.into(), func);
    }

    /// Look up a function by name.
    pub fn get(&self, name: &str) -> Option<&Arc<TemplateFn>> {
        self.funcs.get(name)
    }

    /// Check whether a function is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Registered function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.funcs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FuncRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncRegistry")
            .field("funcs", &self.names())
            .finish()
    }
}

/// Serialize a value as JSON that is safe to inline in a document.
///
/// Characters that could end a script block or an attribute are written as
/// `\uXXXX` escapes, which leaves the JSON value unchanged.
pub fn marshal(value: &Value) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\'' => out.push_str("\\u0027"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Pass a string through unchanged, or join a list of strings with newlines.
///
/// `null` yields an empty string.
pub fn raw(value: &Value) -> Result<String, String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.as_str()),
                other => Err(format!("expected a list of strings, found {}", other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|lines| lines.join("\n")),
        other => Err(format!("expected a string or list of strings, found {}", other)),
    }
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === marshal Tests ===

    #[test]
    fn test_marshal_object() {
        let value = json!({"locale": "en", "name": "test"});
        assert_eq!(marshal(&value).unwrap(), r#"{"locale":"en","name":"test"}"#);
    }

    #[test]
    fn test_marshal_escapes_markup() {
        let value = json!({"html": "</script><b>'a' & b</b>"});
        let out = marshal(&value).unwrap();

        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(!out.contains('\''));
        assert!(!out.contains('&'));

        let decoded: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_marshal_line_separators() {
        let value = json!("a\u{2028}b\u{2029}c");
        assert_eq!(marshal(&value).unwrap(), r#""a\u2028b\u2029c""#);
    }

    // === raw Tests ===

    #[test]
    fn test_raw_list_joins_with_newlines() {
        let block = json!(["<h1>Hello</h1>", "<p>From the test</p>"]);
        assert_eq!(raw(&block).unwrap(), "<h1>Hello</h1>\n<p>From the test</p>");
    }

    #[test]
    fn test_raw_single_string() {
        assert_eq!(raw(&json!("Hello<br>")).unwrap(), "Hello<br>");
    }

    #[test]
    fn test_raw_null_is_empty() {
        assert_eq!(raw(&Value::Null).unwrap(), "");
    }

    #[test]
    fn test_raw_rejects_other_values() {
        assert!(raw(&json!(42)).is_err());
        assert!(raw(&json!(["ok", 1])).is_err());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    // === Registry Tests ===

    #[test]
    fn test_builtins_registered() {
        let registry = FuncRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["lines", "marshal", "raw"]);
    }

    #[test]
    fn test_builtin_outputs_are_trusted() {
        let registry = FuncRegistry::with_builtins();
        let lines = registry.get("lines").unwrap();

        assert_eq!(
            lines(&json!(["<a>", "<b>"])).unwrap(),
            Output::Html("<a>\n<b>".to_string())
        );
    }

    #[test]
    fn test_insert_replaces() {
        let mut registry = FuncRegistry::with_builtins();
        registry.insert("raw", |_: &Value| Ok(Output::Text("replaced".to_string())));

        let raw_fn = registry.get("raw").unwrap();
        assert_eq!(
            raw_fn(&json!("x")).unwrap(),
            Output::Text("replaced".to_string())
        );
        assert_eq!(registry.names().len(), 3);
    }
}
