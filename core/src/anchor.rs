#![deny(missing_docs)]

//! # Anchor Matching
//!
//! Locates structural anchors inside a document using bounded regular expressions.
//!
//! Every pattern is compiled in dot-all mode, so an anchor may span several lines,
//! and must end with an explicit literal terminator. Each occurrence is tightened to
//! the smallest match ending at the same place, so a lazy group that starts too
//! early (e.g. at a previous sibling block) cannot swallow unrelated content.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::fmt::Display;

/// A compiled, terminator-bounded anchor.
#[derive(Debug, Clone)]
pub struct AnchorPattern {
    name: String,
    regex: Regex,
    max_matches: usize,
}

/// A span of the document captured by a named group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Byte offset of the first captured byte.
    pub start: usize,
    /// Byte offset one past the last captured byte.
    pub end: usize,
    /// Captured text.
    pub text: String,
}

/// One occurrence of an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Byte offset where the occurrence starts.
    pub start: usize,
    /// Byte offset one past the terminator.
    pub end: usize,
    /// Named groups that participated in the match, in pattern order.
    pub groups: IndexMap<String, Capture>,
}

impl Match {
    /// Returns the text of a named group, if it participated.
    pub fn group_text(&self, name: &str) -> Option<&str> {
        self.groups.get(name).map(|c| c.text.as_str())
    }

    /// Returns the span of `group`, or the whole match when `group` is `None`.
    pub fn span(&self, group: Option<&str>) -> AppResult<(usize, usize)> {
        match group {
            None => Ok((self.start, self.end)),
            Some(name) => self
                .groups
                .get(name)
                .map(|c| (c.start, c.end))
                .ok_or_else(|| AppError::AnchorNotFound {
                    anchor: format!("group '{}'", name),
                }),
        }
    }
}

impl AnchorPattern {
    /// Compiles `body` followed by the literal `terminator`.
    ///
    /// `body` is a regular expression; `terminator` is matched verbatim and must not be
    /// empty. Occurrence count defaults to exactly-one semantics (`max_matches == 1`).
    pub fn bounded(name: impl Into<String>, body: &str, terminator: &str) -> AppResult<Self> {
        let name = name.into();
        if terminator.trim().is_empty() {
            return Err(AppError::General(format!(
                "Anchor '{}' has no terminator token",
                name
            )));
        }
        let source = format!("(?s)(?:{}){}", body, regex::escape(terminator));
        let regex = Regex::new(&source)?;
        Ok(Self {
            name,
            regex,
            max_matches: 1,
        })
    }

    /// Sets the maximum number of occurrences `locate` accepts.
    pub fn with_max_matches(mut self, max: usize) -> Self {
        self.max_matches = max.max(1);
        self
    }

    /// The anchor's descriptive name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum accepted number of occurrences.
    pub fn max_matches(&self) -> usize {
        self.max_matches
    }

    /// Names of the capture groups declared by the pattern.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.regex.capture_names().flatten()
    }
}

impl Display for AnchorPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Finds every non-overlapping occurrence of `pattern` in `document`.
///
/// An absent anchor yields an empty vector.
pub fn find_anchors(document: &str, pattern: &AnchorPattern) -> Vec<Match> {
    let mut found = Vec::new();
    let mut pos = 0;

    while pos <= document.len() {
        let Some(first) = pattern.regex.find_at(document, pos) else {
            break;
        };
        let Some(caps) = tighten(document, &pattern.regex, first.start(), first.end()) else {
            break;
        };

        found.push(to_match(&pattern.regex, &caps));

        pos = if first.end() > first.start() {
            first.end()
        } else {
            match next_boundary(document, first.end()) {
                Some(next) => next,
                None => break,
            }
        };
    }

    log::debug!("anchor '{}': {} match(es)", pattern.name, found.len());
    found
}

/// Like [`find_anchors`], but rejects more occurrences than the pattern allows.
pub fn locate(document: &str, pattern: &AnchorPattern) -> AppResult<Vec<Match>> {
    let found = find_anchors(document, pattern);
    if found.len() > pattern.max_matches {
        return Err(AppError::AmbiguousMatch {
            anchor: pattern.name.clone(),
            found: found.len(),
            max: pattern.max_matches,
        });
    }
    Ok(found)
}

/// Captures the match with the latest start that still ends by `end`.
///
/// Whether any match starts at or after an offset only changes once as the offset
/// grows, so the latest start is found by bisection: each step is one linear
/// search and tightening stays O(n log n).
fn tighten<'h>(document: &'h str, regex: &Regex, start: usize, end: usize) -> Option<Captures<'h>> {
    let hay = &document[..end];
    // A match starts at `lo`; none starts at or after `hi`.
    let (mut lo, mut hi) = (start, end);
    loop {
        let mut mid = lo + (hi - lo) / 2;
        while !hay.is_char_boundary(mid) {
            mid -= 1;
        }
        if mid <= lo {
            match next_boundary(hay, lo) {
                Some(next) if next < hi => mid = next,
                _ => break,
            }
        }
        match regex.find_at(hay, mid) {
            Some(m) => lo = m.start(),
            None => hi = mid,
        }
    }
    regex.captures_at(hay, lo)
}

fn next_boundary(document: &str, at: usize) -> Option<usize> {
    document[at..].chars().next().map(|c| at + c.len_utf8())
}

fn to_match(regex: &Regex, caps: &Captures<'_>) -> Match {
    let (start, end) = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
    let groups = regex
        .capture_names()
        .flatten()
        .filter_map(|name| {
            caps.name(name).map(|m| {
                (
                    name.to_string(),
                    Capture {
                        start: m.start(),
                        end: m.end(),
                        text: m.as_str().to_string(),
                    },
                )
            })
        })
        .collect();

    Match { start, end, groups }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"
<div className="card">
  <div className="grid grid-cols-2 gap-3">
    <input name="b01Start" />
  </div>
</div>
<div className="bg-white rounded-lg p-3 border border-green-300">
  <span>B01</span>
</div>
<div className="card">
  <div className="grid grid-cols-2 gap-3">
    <input name="b02Start" />
  </div>
</div>
<div className="bg-white rounded-lg p-3 border border-blue-300">
  <span>B02</span>
</div>
"#;

    fn grid_anchor(color: &str) -> AnchorPattern {
        AnchorPattern::bounded(
            format!("{}-grid", color),
            r#"<div className="grid grid-cols-2 gap-3">.*?</div>\s*</div>\s*"#,
            &format!(
                r#"<div className="bg-white rounded-lg p-3 border border-{}-300">"#,
                color
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_no_anchor_is_empty_not_error() {
        let anchor = AnchorPattern::bounded("missing", r"<Missing\s*", "/>").unwrap();
        assert!(find_anchors(SETTINGS, &anchor).is_empty());
        assert!(locate(SETTINGS, &anchor).unwrap().is_empty());
    }

    #[test]
    fn test_multiline_match() {
        let found = find_anchors(SETTINGS, &grid_anchor("green"));
        assert_eq!(found.len(), 1);
        let text = &SETTINGS[found[0].start..found[0].end];
        assert!(text.contains("b01Start"));
        assert!(text.ends_with("border-green-300\">"));
    }

    #[test]
    fn test_tightens_to_smallest_match() {
        // The lazy group would start at the B01 grid; tightening must start at B02's.
        let found = find_anchors(SETTINGS, &grid_anchor("blue"));
        assert_eq!(found.len(), 1);
        let text = &SETTINGS[found[0].start..found[0].end];
        assert!(text.contains("b02Start"));
        assert!(!text.contains("b01Start"));
        assert!(!text.contains("border-green-300"));
    }

    #[test]
    fn test_named_groups() {
        let anchor = AnchorPattern::bounded(
            "state",
            r"useState\(\{(?P<body>.*?)",
            "})",
        )
        .unwrap();
        let doc = "const [a, setA] = useState({\n  x: 1,\n  y: 2\n})\nconst b = 1";
        let found = find_anchors(doc, &anchor);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].group_text("body"), Some("\n  x: 1,\n  y: 2\n"));
        let (start, end) = found[0].span(Some("body")).unwrap();
        assert_eq!(&doc[start..end], "\n  x: 1,\n  y: 2\n");
        assert!(found[0].span(Some("nope")).is_err());
    }

    #[test]
    fn test_ambiguous_match_is_reported() {
        let anchor = AnchorPattern::bounded("card", r#"<div className=""#, r#"card">"#).unwrap();
        let err = locate(SETTINGS, &anchor).unwrap_err();
        assert!(matches!(err, AppError::AmbiguousMatch { found: 2, max: 1, .. }));

        let relaxed = anchor.with_max_matches(2);
        assert_eq!(locate(SETTINGS, &relaxed).unwrap().len(), 2);
    }

    #[test]
    fn test_requires_terminator() {
        assert!(AnchorPattern::bounded("open", ".*", "  ").is_err());
    }

    #[test]
    fn test_tightening_stays_fast_on_large_documents() {
        let doc = format!("{}END", "x\n".repeat(20_000));
        let anchor = AnchorPattern::bounded("tail", r"\s*(?P<body>.*?)", "END").unwrap();

        let started = std::time::Instant::now();
        let found = find_anchors(&doc, &anchor);
        let elapsed = started.elapsed();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, doc.len() - 3);
        assert_eq!(found[0].group_text("body"), Some(""));
        assert!(elapsed < std::time::Duration::from_secs(2), "took {:?}", elapsed);
    }

    #[test]
    fn test_tightening_across_multibyte_starts() {
        let anchor = AnchorPattern::bounded("tail", r"(?P<body>.*?)", ";").unwrap();
        let found = find_anchors("ñé€;", &anchor);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, "ñé€".len());
    }

    #[test]
    fn test_multibyte_text() {
        let anchor = AnchorPattern::bounded("exp", "Expiración", ":").unwrap();
        let doc = "ñ Expiración: á Expiración:";
        let found = find_anchors(doc, &anchor);
        assert_eq!(found.len(), 2);
        assert_eq!(&doc[found[1].start..found[1].end], "Expiración:");
    }
}
