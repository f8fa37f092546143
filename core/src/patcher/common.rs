use crate::anchor::AnchorPattern;
use crate::error::{AppError, AppResult};
use crate::schema::FieldAddition;
use crate::template::{Bindings, Template};
use crate::variant::VariantSpec;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Where a fragment goes relative to its anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Immediately before the anchor (or its group).
    Before,
    /// Immediately after the anchor (or its group).
    #[default]
    After,
}

/// Declarative anchor: a pattern body, its literal terminator and occurrence limit.
///
/// Both `pattern` and `terminator` may use `{{placeholders}}`; values substituted
/// into `pattern` are regex-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSpec {
    /// Regular expression body, matched in dot-all mode.
    pub pattern: String,
    /// Literal token that must close every occurrence.
    pub terminator: String,
    /// Maximum accepted occurrences; more is an ambiguous match.
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
    /// Named group the operation targets instead of the whole match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

fn default_max_matches() -> usize {
    1
}

impl AnchorSpec {
    /// Creates an anchor expected to occur at most once.
    pub fn new(pattern: impl Into<String>, terminator: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            terminator: terminator.into(),
            max_matches: 1,
            group: None,
        }
    }

    /// Targets a named group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Accepts up to `max` occurrences.
    pub fn with_max_matches(mut self, max: usize) -> Self {
        self.max_matches = max;
        self
    }

    /// Renders placeholders and compiles the anchor.
    pub fn compile(&self, name: &str, bindings: &Bindings) -> AppResult<AnchorPattern> {
        let body = Template::parse(self.pattern.as_str()).render_pattern(bindings)?;
        let terminator = Template::parse(self.terminator.as_str()).render(bindings)?;
        let anchor =
            AnchorPattern::bounded(name, &body, &terminator)?.with_max_matches(self.max_matches);

        if let Some(group) = &self.group {
            if !anchor.group_names().any(|g| g == group) {
                return Err(AppError::General(format!(
                    "Anchor '{}' declares no group '{}'",
                    name, group
                )));
            }
        }
        Ok(anchor)
    }
}

/// Fragment repeated once per variant and exposed to the main template as `{{repeat}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repeat {
    /// Per-variant template.
    pub template: String,
    /// Text placed between items.
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    "\n".to_string()
}

/// What an operation does at its anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Splices a rendered fragment next to each occurrence.
    Insert {
        /// Side of the anchor.
        #[serde(default)]
        position: Position,
        /// Fragment template.
        template: String,
        /// Value of `{{binding}}`, e.g. the field the markup reads.
        #[serde(default)]
        binding: String,
        /// Optional per-variant list rendered into `{{repeat}}`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        repeat: Option<Repeat>,
    },
    /// Adds fields to the record literal captured by the anchor.
    ExtendRecord {
        /// Fields to add; every string may use placeholders.
        fields: Vec<FieldAddition>,
    },
}

impl Action {
    /// The `{{binding}}` value this action declares.
    pub fn binding(&self) -> &str {
        match self {
            Action::Insert { binding, .. } => binding,
            Action::ExtendRecord { .. } => "",
        }
    }
}

/// A fully bound operation, ready to run against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Human-readable name used in reports.
    pub label: String,
    /// Where the operation applies.
    pub anchor: AnchorSpec,
    /// What it does there.
    pub action: Action,
    /// Placeholder values.
    pub bindings: Bindings,
    /// Variants iterated by `repeat` blocks.
    pub variants: Vec<VariantSpec>,
}

impl Operation {
    /// Creates an operation with no bindings.
    pub fn new(label: impl Into<String>, anchor: AnchorSpec, action: Action) -> Self {
        Self {
            label: label.into(),
            anchor,
            action,
            bindings: Bindings::new(),
            variants: Vec::new(),
        }
    }

    /// Replaces the placeholder values.
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Sets the variants iterated by `repeat` blocks.
    pub fn with_variants(mut self, variants: Vec<VariantSpec>) -> Self {
        self.variants = variants;
        self
    }
}

/// What happened to one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    /// The document was changed.
    Applied,
    /// Every occurrence already carried the change.
    AlreadyApplied,
    /// The anchor (or the anchor field) is absent.
    AnchorNotFound,
    /// The operation failed and left the document untouched.
    Failed(String),
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Applied => write!(f, "applied"),
            Outcome::AlreadyApplied => write!(f, "already applied"),
            Outcome::AnchorNotFound => write!(f, "anchor not found"),
            Outcome::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// Result of one operation on one document. Lives for one run only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchResult {
    /// Document the operation ran against.
    pub document_id: String,
    /// Operation label.
    pub label: String,
    /// Whether the document text changed.
    pub applied: bool,
    /// Occurrences of the anchor that were found.
    pub match_count: usize,
    /// Detailed outcome.
    pub outcome: Outcome,
}

/// Text of a document after a batch, plus per-operation results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Final document text.
    pub text: String,
    /// One entry per operation, in order.
    pub results: Vec<PatchResult>,
}

impl Applied {
    /// True if at least one operation changed the text.
    pub fn changed(&self) -> bool {
        self.results.iter().any(|r| r.applied)
    }
}

/// Outcome of a single successful operation step.
pub(crate) struct Step {
    pub(crate) text: Option<String>,
    pub(crate) match_count: usize,
    pub(crate) outcome: Outcome,
}

impl Step {
    pub(crate) fn missing() -> Self {
        Self::missing_in(0)
    }

    /// The anchor occurred `match_count` times but what the operation targets inside
    /// it (e.g. a record field) did not.
    pub(crate) fn missing_in(match_count: usize) -> Self {
        Self {
            text: None,
            match_count,
            outcome: Outcome::AnchorNotFound,
        }
    }

    pub(crate) fn finish(text: String, changed: usize, match_count: usize) -> Self {
        if changed == 0 {
            Self {
                text: None,
                match_count,
                outcome: Outcome::AlreadyApplied,
            }
        } else {
            Self {
                text: Some(text),
                match_count,
                outcome: Outcome::Applied,
            }
        }
    }
}
