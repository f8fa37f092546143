#![deny(missing_docs)]

//! # Record Schemas
//!
//! Extends record (object) literals with new fields.
//!
//! - [`RecordSchema`]: ordered field → default-literal map, extended in memory.
//! - [`RecordLiteral`]: byte-accurate view of a literal body in a document, used to
//!   splice new entries without touching any other byte.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One field to add after an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAddition {
    /// Existing field the new one follows.
    pub after: String,
    /// Name of the new field.
    pub field: String,
    /// Default value, written verbatim (e.g. `''`).
    pub default: String,
}

impl FieldAddition {
    /// Creates an addition.
    pub fn new(after: impl Into<String>, field: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            after: after.into(),
            field: field.into(),
            default: default.into(),
        }
    }
}

/// Ordered mapping from field name to default literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    fields: IndexMap<String, String>,
}

impl RecordSchema {
    /// Builds a schema from `(name, default)` pairs, keeping their order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Reads the schema of a literal body such as `a: 1, b: 'x'`.
    pub fn parse(body: &str) -> AppResult<Self> {
        let literal = RecordLiteral::parse(body)?;
        Ok(Self::from_pairs(
            literal
                .entries
                .iter()
                .map(|e| (e.key.clone(), body[e.value_start..e.value_end].to_string())),
        ))
    }

    /// Field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Default literal of a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// True if `field` is declared.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Inserts each addition right after its anchor field.
    ///
    /// Additions whose field already exists are skipped, so the operation can be
    /// repeated. A missing anchor field fails with `AnchorNotFound`.
    pub fn extend(&self, additions: &[FieldAddition]) -> AppResult<Self> {
        let mut fields = self.fields.clone();
        for add in additions {
            if fields.contains_key(&add.field) {
                log::debug!("field '{}' already declared, skipping", add.field);
                continue;
            }
            let index = fields
                .get_index_of(&add.after)
                .ok_or_else(|| AppError::AnchorNotFound {
                    anchor: format!("field '{}'", add.after),
                })?;
            fields.shift_insert(index + 1, add.field.clone(), add.default.clone());
        }
        Ok(Self { fields })
    }
}

/// One `key: value` entry of a literal, by byte offsets into the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// Field name (quotes removed).
    pub key: String,
    /// Offset of the first byte of the key.
    pub key_start: usize,
    /// Offset of the first byte of the value.
    pub value_start: usize,
    /// Offset one past the last byte of the value, trailing comments excluded.
    pub value_end: usize,
    /// Offset one past the separating comma, if the entry has one.
    pub comma_end: Option<usize>,
}

/// Parsed body of a record literal (text between its braces).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLiteral {
    /// Entries in source order.
    pub entries: Vec<RecordEntry>,
}

/// Outcome of splicing additions into a literal body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralExtension {
    /// The new body text.
    pub text: String,
    /// Fields actually inserted.
    pub inserted: Vec<String>,
    /// Fields skipped because they were already declared.
    pub skipped: Vec<String>,
}

impl RecordLiteral {
    /// Parses a literal body.
    ///
    /// Supports identifier and quoted keys, shorthand (`{ a, b }`) and spread
    /// (`...rest`) entries, nested brackets, string literals and comments.
    pub fn parse(body: &str) -> AppResult<Self> {
        let bytes = body.as_bytes();
        let mut pos = 0;
        let mut entries = Vec::new();

        loop {
            pos = skip_trivia(body, pos);
            if pos >= bytes.len() {
                break;
            }

            let key_start = pos;
            let key;
            let key_end;
            if body[pos..].starts_with("...") {
                let (end, stop) = scan_value(body, pos)?;
                key = body[pos..end].to_string();
                key_end = end;
                pos = stop;
            } else if bytes[pos] == b'\'' || bytes[pos] == b'"' {
                let end = skip_string(body, pos)?;
                key = body[pos + 1..end - 1].to_string();
                key_end = end;
                pos = end;
            } else {
                let end = pos
                    + body[pos..]
                        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                        .unwrap_or(body.len() - pos);
                if end == pos {
                    return Err(AppError::InvalidRecord(format!(
                        "expected a field name at byte {}",
                        pos
                    )));
                }
                key = body[pos..end].to_string();
                key_end = end;
                pos = end;
            }

            pos = skip_trivia(body, pos);
            let (value_start, value_end) = if body[pos..].starts_with(':') {
                let start = skip_trivia(body, pos + 1);
                let (end, stop) = scan_value(body, start)?;
                pos = stop;
                (start, end)
            } else {
                // Shorthand or spread: the key is its own value.
                (key_start, key_end)
            };

            pos = skip_trivia(body, pos);
            let comma_end = if body[pos..].starts_with(',') {
                pos += 1;
                Some(pos)
            } else if pos < bytes.len() {
                return Err(AppError::InvalidRecord(format!(
                    "expected ',' after field '{}' at byte {}",
                    key, pos
                )));
            } else {
                None
            };

            entries.push(RecordEntry {
                key,
                key_start,
                value_start,
                value_end,
                comma_end,
            });
        }

        Ok(Self { entries })
    }

    /// Finds an entry by key.
    pub fn entry(&self, key: &str) -> Option<&RecordEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Splices `additions` into `body`, reusing the indentation and comma style of
    /// the anchor entry. Already-declared fields are skipped.
    pub fn extend(body: &str, additions: &[FieldAddition]) -> AppResult<LiteralExtension> {
        let mut text = body.to_string();
        let mut inserted = Vec::new();
        let mut skipped = Vec::new();

        for add in additions {
            let literal = Self::parse(&text)?;
            if literal.entry(&add.field).is_some() {
                skipped.push(add.field.clone());
                continue;
            }
            let anchor = literal
                .entry(&add.after)
                .ok_or_else(|| AppError::AnchorNotFound {
                    anchor: format!("field '{}'", add.after),
                })?;

            let indent = detect_indent(&text, anchor.key_start);
            let declaration = format!("{}: {}", add.field, add.default);

            // One entry per line: the new entry goes below any comment trailing the anchor.
            let one_per_line = indent.is_some();
            let separator = match &indent {
                Some(indent) => format!("\n{}", indent),
                None => " ".to_string(),
            };

            match anchor.comma_end {
                Some(end) => {
                    let at = if one_per_line { trailing_comment_end(&text, end) } else { end };
                    text.insert_str(at, &format!("{}{},", separator, declaration));
                }
                None => {
                    let value_end = anchor.value_end;
                    let at = if one_per_line {
                        trailing_comment_end(&text, value_end)
                    } else {
                        value_end
                    };
                    text.insert_str(at, &format!("{}{}", separator, declaration));
                    text.insert(value_end, ',');
                }
            }
            inserted.push(add.field.clone());
        }

        Ok(LiteralExtension {
            text,
            inserted,
            skipped,
        })
    }
}

/// Whitespace between the previous newline and `at`, if `at` starts its line.
fn detect_indent(text: &str, at: usize) -> Option<String> {
    let line_start = text[..at].rfind('\n')? + 1;
    let indent = &text[line_start..at];
    indent
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then(|| indent.to_string())
}

fn skip_trivia(body: &str, mut pos: usize) -> usize {
    loop {
        let rest = &body[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();
        if trimmed.starts_with("//") {
            pos += trimmed.find('\n').unwrap_or(trimmed.len());
        } else if trimmed.starts_with("/*") {
            pos += trimmed.find("*/").map_or(trimmed.len(), |i| i + 2);
        } else {
            return pos;
        }
    }
}

/// Returns the offset just past the string literal starting at `start`.
fn skip_string(body: &str, start: usize) -> AppResult<usize> {
    let bytes = body.as_bytes();
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(AppError::InvalidRecord(format!(
        "unterminated string starting at byte {}",
        start
    )))
}

/// Scans the value at `start`.
///
/// Returns the offset one past its last significant byte (comments and whitespace
/// excluded) and the offset of the top-level `,` ending it, or the body end.
fn scan_value(body: &str, start: usize) -> AppResult<(usize, usize)> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    let mut last = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => {
                i = skip_string(body, i)?;
                last = i;
            }
            b'/' if body[i..].starts_with("//") || body[i..].starts_with("/*") => {
                i = skip_trivia(body, i)
            }
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
                last = i;
            }
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    AppError::InvalidRecord(format!("unbalanced '{}' at byte {}", bytes[i] as char, i))
                })?;
                i += 1;
                last = i;
            }
            b',' if depth == 0 => return Ok((last, i)),
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                i += 1;
                last = i;
            }
        }
    }
    if depth != 0 {
        return Err(AppError::InvalidRecord("unclosed bracket in value".into()));
    }
    Ok((last, bytes.len()))
}

/// End of the comments following `at` on its line, or `at` when there are none.
fn trailing_comment_end(text: &str, at: usize) -> usize {
    let mut end = at;
    loop {
        let rest = &text[end..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        let pos = end + (rest.len() - trimmed.len());
        if trimmed.starts_with("//") {
            return pos + trimmed.find('\n').unwrap_or(trimmed.len());
        }
        match trimmed.strip_prefix("/*").and_then(|c| c.find("*/")) {
            Some(close) => end = pos + 2 + close + 2,
            None => return end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NCF_STATE: &str = "
    b01Start: '00000001',
    b01End: '00001000',
    b01Current: '00000001',
    b02Start: '00000001',
    b02End: '00001000',
    b02Current: '00000001'
  ";

    fn expiry_additions(ids: &[&str]) -> Vec<FieldAddition> {
        ids.iter()
            .map(|id| FieldAddition::new(format!("{}Current", id), format!("{}ExpiryDate", id), "''"))
            .collect()
    }

    #[test]
    fn test_schema_extend_keeps_order() {
        let schema = RecordSchema::parse(NCF_STATE).unwrap();
        let extended = schema.extend(&expiry_additions(&["b01"])).unwrap();
        let keys: Vec<_> = extended.keys().collect();
        assert_eq!(
            keys,
            vec!["b01Start", "b01End", "b01Current", "b01ExpiryDate", "b02Start", "b02End", "b02Current"]
        );
        assert_eq!(extended.get("b01ExpiryDate"), Some("''"));
        assert_eq!(extended.get("b02End"), Some("'00001000'"));
    }

    #[test]
    fn test_schema_extend_twice_is_single() {
        let schema = RecordSchema::parse(NCF_STATE).unwrap();
        let adds = expiry_additions(&["b01"]);
        let twice = schema.extend(&adds).unwrap().extend(&adds).unwrap();
        assert_eq!(twice.keys().filter(|k| *k == "b01ExpiryDate").count(), 1);
        assert_eq!(twice.len(), schema.len() + 1);
    }

    #[test]
    fn test_schema_missing_anchor() {
        let schema = RecordSchema::from_pairs([("a", "1")]);
        let err = schema
            .extend(&[FieldAddition::new("b", "c", "0")])
            .unwrap_err();
        assert!(matches!(err, AppError::AnchorNotFound { .. }));
    }

    #[test]
    fn test_literal_extend_multiline() {
        let ext = RecordLiteral::extend(NCF_STATE, &expiry_additions(&["b01", "b02"])).unwrap();
        let expected = "
    b01Start: '00000001',
    b01End: '00001000',
    b01Current: '00000001',
    b01ExpiryDate: '',
    b02Start: '00000001',
    b02End: '00001000',
    b02Current: '00000001',
    b02ExpiryDate: ''
  ";
        assert_eq!(ext.text, expected);
        assert_eq!(ext.inserted, vec!["b01ExpiryDate", "b02ExpiryDate"]);

        let again = RecordLiteral::extend(&ext.text, &expiry_additions(&["b01", "b02"])).unwrap();
        assert_eq!(again.text, ext.text);
        assert!(again.inserted.is_empty());
        assert_eq!(again.skipped.len(), 2);
    }

    #[test]
    fn test_literal_extend_single_line() {
        let ext = RecordLiteral::extend(" a: 1, b: 2 ", &[FieldAddition::new("a", "x", "null")]).unwrap();
        assert_eq!(ext.text, " a: 1, x: null, b: 2 ");
        let ext = RecordLiteral::extend(" a: 1, b: 2 ", &[FieldAddition::new("b", "y", "[]")]).unwrap();
        assert_eq!(ext.text, " a: 1, b: 2, y: [] ");
    }

    #[test]
    fn test_literal_extend_after_commented_last_entry() {
        let body = "\n    b01Current: '00000001' // current counter\n  ";
        let adds = expiry_additions(&["b01"]);
        let ext = RecordLiteral::extend(body, &adds).unwrap();
        assert_eq!(
            ext.text,
            "\n    b01Current: '00000001', // current counter\n    b01ExpiryDate: ''\n  "
        );

        let schema = RecordSchema::parse(&ext.text).unwrap();
        assert_eq!(schema.keys().collect::<Vec<_>>(), vec!["b01Current", "b01ExpiryDate"]);
        assert_eq!(schema.get("b01Current"), Some("'00000001'"));

        let again = RecordLiteral::extend(&ext.text, &adds).unwrap();
        assert_eq!(again.text, ext.text);
        assert_eq!(again.skipped, vec!["b01ExpiryDate"]);
    }

    #[test]
    fn test_literal_extend_keeps_comments_with_their_entry() {
        let body = "\n    b01Current: '1', // counter\n    b02Start: '1' /* first */\n";
        let ext = RecordLiteral::extend(
            body,
            &[
                FieldAddition::new("b01Current", "b01ExpiryDate", "''"),
                FieldAddition::new("b02Start", "b02ExpiryDate", "''"),
            ],
        )
        .unwrap();
        assert_eq!(
            ext.text,
            "\n    b01Current: '1', // counter\n    b01ExpiryDate: '',\n    b02Start: '1', /* first */\n    b02ExpiryDate: ''\n"
        );
    }

    #[test]
    fn test_parse_complex_values() {
        let body = r#"
    // counters
    "quoted-key": 'a, b',
    lastSyncDate: null as Date | null,
    nested: { x: [1, 2], y: fn(a, b) },
    shorthand,
    ...rest
  "#;
        let literal = RecordLiteral::parse(body).unwrap();
        let keys: Vec<_> = literal.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["quoted-key", "lastSyncDate", "nested", "shorthand", "...rest"]);
        let schema = RecordSchema::parse(body).unwrap();
        assert_eq!(schema.get("lastSyncDate"), Some("null as Date | null"));
        assert_eq!(schema.get("nested"), Some("{ x: [1, 2], y: fn(a, b) }"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RecordLiteral::parse("a: 'open").is_err());
        assert!(RecordLiteral::parse("a: 1), b: 2").is_err());
        assert!(RecordLiteral::parse("a b").is_err());
        assert!(RecordLiteral::parse(": 1").is_err());
    }
}
