//! Template engine contract and the built-in engine.

use std::fmt;

use inertia_core::ViewData;
use serde_json::Value;

use crate::error::TemplateError;
use crate::funcs::{escape_html, FuncRegistry, Output};

/// Compiles template sources.
pub trait TemplateEngine: Send + Sync {
    /// Compile a template once so it can be executed many times.
    fn compile(&self, name: &str, source: &str) -> Result<Box<dyn CompiledTemplate>, TemplateError>;
}

/// A template ready to produce documents.
pub trait CompiledTemplate: Send + Sync + fmt::Debug {
    /// Template name, used in error messages.
    fn name(&self) -> &str;

    /// Render the document for one request.
    fn execute(&self, data: &ViewData, funcs: &FuncRegistry) -> Result<String, TemplateError>;
}

/// A small engine covering what a root template needs.
///
/// Supported actions:
/// - `{{ page.component }}` - look up a value, HTML-escaped
/// - `{{ marshal page }}` - call a helper function with one argument
/// - `{{ if ssr }} ... {{ else }} ... {{ end }}` - conditionals
///
/// A single word that names a registered function calls it with `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicEngine;

impl BasicEngine {
    /// Create the engine.
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for BasicEngine {
    fn compile(&self, name: &str, source: &str) -> Result<Box<dyn CompiledTemplate>, TemplateError> {
        let parse_err = |message: String| TemplateError::Parse {
            template: name.to_string(),
            message,
        };

        let mut tokens = tokenize(source).map_err(parse_err)?.into_iter();
        let (nodes, end) = parse_block(&mut tokens, false).map_err(parse_err)?;
        debug_assert_eq!(end, Terminator::Eof);

        Ok(Box::new(BasicTemplate {
            name: name.to_string(),
            nodes,
        }))
    }
}

/// A template compiled by [`BasicEngine`].
#[derive(Debug, Clone)]
pub struct BasicTemplate {
    name: String,
    nodes: Vec<Node>,
}

impl CompiledTemplate for BasicTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, data: &ViewData, funcs: &FuncRegistry) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.write_nodes(&self.nodes, data, funcs, &mut out)?;
        Ok(out)
    }
}

impl BasicTemplate {
    fn write_nodes(
        &self,
        nodes: &[Node],
        data: &ViewData,
        funcs: &FuncRegistry,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Value(path) => {
                    if let [name] = path.as_slice() {
                        if funcs.contains(name) {
                            self.call(name, &Value::Null, funcs, out)?;
                            continue;
                        }
                    }
                    write_value(lookup(data, path), out);
                }
                Node::Call { func, arg } => {
                    let value = lookup(data, arg).unwrap_or(&Value::Null);
                    self.call(func, value, funcs, out)?;
                }
                Node::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    let branch = if lookup(data, cond).is_some_and(truthy) {
                        then
                    } else {
                        otherwise
                    };
                    self.write_nodes(branch, data, funcs, out)?;
                }
            }
        }
        Ok(())
    }

    fn call(
        &self,
        name: &str,
        arg: &Value,
        funcs: &FuncRegistry,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        let func = funcs
            .get(name)
            .ok_or_else(|| TemplateError::UnknownFunction {
                template: self.name.clone(),
                name: name.to_string(),
            })?;

        match (**func)(arg) {
            Ok(Output::Html(html)) => out.push_str(&html),
            Ok(Output::Text(text)) => out.push_str(&escape_html(&text)),
            Err(message) => {
                return Err(TemplateError::Function {
                    template: self.name.clone(),
                    name: name.to_string(),
                    message,
                })
            }
        }
        Ok(())
    }
}

/// A dotted lookup path such as `page.props.user`.
type Path = Vec<String>;

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Value(Path),
    Call {
        func: String,
        arg: Path,
    },
    If {
        cond: Path,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug)]
enum Token {
    Text(String),
    Action(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Eof,
    Else,
    End,
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| "unclosed action".to_string())?;
        tokens.push(Token::Action(after[..end].trim().to_string()));
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }

    Ok(tokens)
}

fn parse_block(
    tokens: &mut impl Iterator<Item = Token>,
    in_if: bool,
) -> Result<(Vec<Node>, Terminator), String> {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.next() {
        let action = match token {
            Token::Text(text) => {
                nodes.push(Node::Text(text));
                continue;
            }
            Token::Action(action) => action,
        };

        let words: Vec<&str> = action.split_whitespace().collect();
        match words.as_slice() {
            [] => return Err("empty action".to_string()),
            ["else"] if in_if => return Ok((nodes, Terminator::Else)),
            ["end"] if in_if => return Ok((nodes, Terminator::End)),
            ["else"] | ["end"] => return Err(format!("unexpected {{{{ {} }}}}", action)),
            ["if"] => return Err("missing condition in if".to_string()),
            ["if", cond] => {
                let cond = parse_path(cond)?;
                let (then, end) = parse_block(tokens, true)?;
                let otherwise = match end {
                    Terminator::End => Vec::new(),
                    Terminator::Else => {
                        let (otherwise, end) = parse_block(tokens, true)?;
                        if end != Terminator::End {
                            return Err("expected end after else".to_string());
                        }
                        otherwise
                    }
                    Terminator::Eof => return Err("missing end for if".to_string()),
                };
                nodes.push(Node::If {
                    cond,
                    then,
                    otherwise,
                });
            }
            [path] => nodes.push(Node::Value(parse_path(path)?)),
            [func, arg] => nodes.push(Node::Call {
                func: func.to_string(),
                arg: parse_path(arg)?,
            }),
            _ => return Err(format!("cannot parse action '{}'", action)),
        }
    }

    Ok((nodes, Terminator::Eof))
}

fn parse_path(text: &str) -> Result<Path, String> {
    let path: Path = text
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect();
    if path.is_empty() {
        return Err(format!("invalid path '{}'", text));
    }
    Ok(path)
}

fn lookup<'a>(data: &'a ViewData, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = data.get(first)?;
    for segment in rest {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn write_value(value: Option<&Value>, out: &mut String) {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => out.push_str(&escape_html(s)),
        Some(other) => out.push_str(&escape_html(&other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, data: Value) -> Result<String, TemplateError> {
        let data = match data {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        };
        BasicEngine::new()
            .compile("test.html", source)?
            .execute(&data, &FuncRegistry::with_builtins())
    }

    // === Lookup Tests ===

    #[test]
    fn test_plain_text() {
        assert_eq!(render("<p>hi</p>", json!({})).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_value_is_escaped() {
        let out = render("<h1>{{ title }}</h1>", json!({"title": "<b>Tom & Jerry</b>"})).unwrap();
        assert_eq!(out, "<h1>&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;</h1>");
    }

    #[test]
    fn test_nested_lookup() {
        let data = json!({"page": {"props": {"users": [{"name": "Ada"}]}}});
        assert_eq!(render("{{ page.props.users.0.name }}", data).unwrap(), "Ada");
    }

    #[test]
    fn test_leading_dot_is_accepted() {
        assert_eq!(render("{{ .title }}", json!({"title": "x"})).unwrap(), "x");
    }

    #[test]
    fn test_missing_value_renders_empty() {
        assert_eq!(render("[{{ nothing.here }}]", json!({})).unwrap(), "[]");
    }

    #[test]
    fn test_numbers_render() {
        assert_eq!(render("{{ n }}", json!({"n": 42})).unwrap(), "42");
    }

    // === Function Tests ===

    #[test]
    fn test_marshal_page() {
        let data = json!({"page": {"component": "home", "props": {}}});
        let out = render("<div data-page='{{ marshal page }}'></div>", data).unwrap();
        assert_eq!(
            out,
            r#"<div data-page='{"component":"home","props":{}}'></div>"#
        );
    }

    #[test]
    fn test_lines_and_raw_are_not_escaped() {
        let data = json!({"ssr": {"head": ["<title>A</title>", "<meta a>"], "body": "<div>B</div>"}});
        let out = render("{{ lines ssr.head }}|{{ raw ssr.body }}", data).unwrap();
        assert_eq!(out, "<title>A</title>\n<meta a>|<div>B</div>");
    }

    #[test]
    fn test_unknown_function() {
        let err = render("{{ shout title }}", json!({"title": "x"})).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownFunction { ref name, .. } if name == "shout"));
    }

    #[test]
    fn test_function_error_is_reported() {
        let err = render("{{ raw n }}", json!({"n": 1})).unwrap_err();
        assert!(matches!(err, TemplateError::Function { ref name, .. } if name == "raw"));
    }

    #[test]
    fn test_zero_arg_function() {
        let mut funcs = FuncRegistry::with_builtins();
        funcs.insert("year", |_: &Value| Ok(Output::Text("2024".to_string())));

        let template = BasicEngine::new().compile("t", "(c) {{ year }}").unwrap();
        assert_eq!(template.execute(&ViewData::new(), &funcs).unwrap(), "(c) 2024");
    }

    #[test]
    fn test_text_output_is_escaped() {
        let mut funcs = FuncRegistry::new();
        funcs.insert("upper", |v: &Value| {
            Ok(Output::Text(v.as_str().unwrap_or_default().to_uppercase()))
        });

        let template = BasicEngine::new().compile("t", "{{ upper name }}").unwrap();
        let mut data = ViewData::new();
        data.insert("name".to_string(), json!("<a>"));
        assert_eq!(template.execute(&data, &funcs).unwrap(), "&lt;A&gt;");
    }

    // === Conditional Tests ===

    #[test]
    fn test_if_else() {
        let source = "{{ if ssr }}{{ raw ssr.body }}{{ else }}<div id=\"app\"></div>{{ end }}";

        assert_eq!(
            render(source, json!({"ssr": {"body": "<main/>"}})).unwrap(),
            "<main/>"
        );
        assert_eq!(
            render(source, json!({"ssr": null})).unwrap(),
            "<div id=\"app\"></div>"
        );
    }

    #[test]
    fn test_nested_if() {
        let source = "{{ if a }}A{{ if b }}B{{ end }}{{ end }}";
        assert_eq!(render(source, json!({"a": true, "b": false})).unwrap(), "A");
        assert_eq!(render(source, json!({"a": true, "b": 1})).unwrap(), "AB");
        assert_eq!(render(source, json!({"a": "", "b": 1})).unwrap(), "");
    }

    #[test]
    fn test_truthiness() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!([])));
        assert!(!truthy(&json!({})));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!({"a": 1})));
    }

    // === Parse Error Tests ===

    #[test]
    fn test_unclosed_action() {
        let err = render("{{ title ", json!({})).unwrap_err();
        assert!(matches!(err, TemplateError::Parse { .. }));
    }

    #[test]
    fn test_missing_end() {
        assert!(render("{{ if a }}x", json!({})).is_err());
    }

    #[test]
    fn test_stray_end() {
        assert!(render("x{{ end }}", json!({})).is_err());
    }

    #[test]
    fn test_double_else() {
        assert!(render("{{ if a }}1{{ else }}2{{ else }}3{{ end }}", json!({})).is_err());
    }

    #[test]
    fn test_empty_action() {
        assert!(render("{{ }}", json!({})).is_err());
    }
}
