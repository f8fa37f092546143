#![deny(missing_docs)]

//! # Fragment Templates
//!
//! Templates are plain text with `{{name}}` placeholders. Only identifier-shaped
//! placeholders are recognised, so host syntax such as JSX `style={{ color: 'red' }}`
//! passes through untouched.
//!
//! Fragments (text spliced into a document) are additionally checked for bracket
//! balance so a generated block cannot leave the host document with an unmatched
//! `(`, `[` or `{`.

use crate::error::{AppError, AppResult};
use crate::variant::VariantSpec;
use indexmap::IndexMap;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

/// Placeholder values available while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: IndexMap<String, String>,
}

impl Bindings {
    /// Creates an empty set of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings for one variant: `id`, `id_lower`, `color`, `required_field` and `binding`.
    pub fn for_variant(variant: &VariantSpec, binding_field: &str) -> Self {
        let mut b = Self::new();
        b.insert("id", &variant.id);
        b.insert("id_lower", variant.id_lower());
        b.insert("color", &variant.color);
        b.insert("required_field", &variant.required_field);
        b.insert("binding", binding_field);
        b
    }

    /// Adds or replaces a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Adds every entry of `vars` that is not already bound.
    pub fn with_defaults(mut self, vars: &IndexMap<String, String>) -> Self {
        for (k, v) in vars {
            self.values.entry(k.clone()).or_insert_with(|| v.clone());
        }
        self
    }

    /// Binds the expiry classifier's constants (`soon_window_ms`, `band_expired`, ...),
    /// replacing any plan value of the same name.
    pub fn with_expiry(mut self) -> Self {
        for (name, value) in crate::expiry::template_values() {
            self.insert(name, value);
        }
        self
    }

    /// Looks up a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// All bound values in insertion order.
    pub fn values(&self) -> &IndexMap<String, String> {
        &self.values
    }
}

fn placeholder_re() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("Invalid regex")
    })
}

impl Template {
    /// Parses a template. Never fails on host syntax; unknown names surface at render time.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in placeholder_re().captures_iter(&source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            segments.push(Segment::Placeholder(name.as_str().to_string()));
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Self { source, segments }
    }

    /// Parses a template meant to be spliced into a document and checks its brackets.
    pub fn fragment(source: impl Into<String>) -> AppResult<Self> {
        let template = Self::parse(source);
        let literal: String = template
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Literal(text) => Some(text.as_str()),
                Segment::Placeholder(_) => None,
            })
            .collect();
        if let Err(reason) = check_balanced(&literal) {
            return Err(template.malformed(reason));
        }
        Ok(template)
    }

    /// The raw template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance (repeats included).
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Renders with plain substitution.
    pub fn render(&self, bindings: &Bindings) -> AppResult<String> {
        self.render_with(bindings, |v| Cow::Borrowed(v))
    }

    /// Renders and checks that the result keeps brackets balanced.
    pub fn render_fragment(&self, bindings: &Bindings) -> AppResult<String> {
        let out = self.render(bindings)?;
        if let Err(reason) = check_balanced(&out) {
            return Err(self.malformed(format!("rendered text has {}", reason)));
        }
        if out.trim().is_empty() {
            return Err(self.malformed("renders to empty text"));
        }
        Ok(out)
    }

    /// Renders with every substituted value regex-escaped, for use inside anchor patterns.
    pub fn render_pattern(&self, bindings: &Bindings) -> AppResult<String> {
        self.render_with(bindings, |v| Cow::Owned(regex::escape(v)))
    }

    fn render_with<F>(&self, bindings: &Bindings, escape: F) -> AppResult<String>
    where
        F: for<'a> Fn(&'a str) -> Cow<'a, str>,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = bindings.get(name).ok_or_else(|| {
                        self.malformed(format!("undefined placeholder '{{{{{}}}}}'", name))
                    })?;
                    out.push_str(&escape(value));
                }
            }
        }
        Ok(out)
    }

    fn malformed(&self, reason: impl Into<String>) -> AppError {
        let mut excerpt: String = self.source.trim().chars().take(60).collect();
        if self.source.trim().chars().count() > 60 {
            excerpt.push('…');
        }
        AppError::MalformedTemplate {
            template: excerpt,
            reason: reason.into(),
        }
    }
}

/// Renders `template` for one variant, binding `{{binding}}` to `binding_field`.
pub fn render(template: &Template, variant: &VariantSpec, binding_field: &str) -> AppResult<String> {
    template.render(&Bindings::for_variant(variant, binding_field))
}

/// Checks that `(`, `[` and `{` are closed in order.
fn check_balanced(text: &str) -> Result<(), String> {
    let mut stack = Vec::new();
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(open) {
                    return Err(format!("unmatched '{}'", c));
                }
            }
            _ => {}
        }
    }
    match stack.pop() {
        Some(open) => Err(format!("unclosed '{}'", open)),
        None => Ok(()),
    }
}
