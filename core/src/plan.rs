#![deny(missing_docs)]

//! # Patch Plans
//!
//! YAML description of what to patch: the variant catalogue, shared template
//! variables, and per-document operation lists.
//!
//! ```yaml
//! variants:
//!   - { id: B01, color: green, required_field: b01ExpiryDate }
//! vars:
//!   expired_color: red
//! documents:
//!   - path: app/settings/page.tsx
//!     operations:
//!       - label: ncf state
//!         kind: extend_record
//!         scope: per_variant
//!         anchor: { pattern: 'useState\(\{(?P<body>.*?)', terminator: '})', group: body }
//!         fields:
//!           - { after: "{{id_lower}}Current", field: "{{required_field}}", default: "''" }
//! ```

use crate::error::{AppError, AppResult};
use crate::patcher::{Action, AnchorSpec, Operation};
use crate::template::Bindings;
use crate::variant::VariantSpec;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Whether an operation runs once or once per variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// A single operation.
    #[default]
    Once,
    /// One operation per catalogue variant, bound to that variant.
    PerVariant,
}

/// One operation as written in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Report label.
    pub label: String,
    /// Expansion scope.
    #[serde(default)]
    pub scope: Scope,
    /// Anchor description.
    pub anchor: AnchorSpec,
    /// The action, tagged by `kind`.
    #[serde(flatten)]
    pub action: Action,
}

/// Operations for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPlan {
    /// Path of the document, relative to the project root.
    pub path: PathBuf,
    /// Operations, applied in order.
    pub operations: Vec<OperationSpec>,
}

/// A complete patch plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchPlan {
    /// Ordered variant catalogue.
    #[serde(default)]
    pub variants: Vec<VariantSpec>,
    /// Values available to every template.
    #[serde(default)]
    pub vars: IndexMap<String, String>,
    /// Documents to patch.
    #[serde(default)]
    pub documents: Vec<DocumentPlan>,
}

impl PatchPlan {
    /// Parses and validates a YAML plan.
    pub fn from_yaml(source: &str) -> AppResult<Self> {
        let plan: PatchPlan = serde_yaml::from_str(source)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Reads a YAML plan from disk.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let source = fs::read_to_string(path).map_err(|e| {
            AppError::General(format!("Failed to read plan {:?}: {}", path, e))
        })?;
        Self::from_yaml(&source)
    }

    /// Checks catalogue and operation invariants that serde cannot express.
    pub fn validate(&self) -> AppResult<()> {
        let mut seen = HashSet::new();
        for v in &self.variants {
            if v.id.trim().is_empty() {
                return Err(AppError::General("Variant with empty id".into()));
            }
            if !seen.insert(v.id.as_str()) {
                return Err(AppError::General(format!("Duplicate variant '{}'", v.id)));
            }
        }

        for doc in &self.documents {
            for op in &doc.operations {
                if op.anchor.terminator.trim().is_empty() {
                    return Err(AppError::General(format!(
                        "{:?}: operation '{}' has no anchor terminator",
                        doc.path, op.label
                    )));
                }
                if op.scope == Scope::PerVariant && self.variants.is_empty() {
                    return Err(AppError::General(format!(
                        "{:?}: operation '{}' is per_variant but the plan has no variants",
                        doc.path, op.label
                    )));
                }
            }
        }
        Ok(())
    }

    /// Expands a document's operations into bound, ready-to-run operations.
    ///
    /// `per_variant` operations become one operation per variant, in catalogue order,
    /// labelled `label [ID]`.
    pub fn operations(&self, document: &DocumentPlan) -> Vec<Operation> {
        let mut ops = Vec::new();
        for spec in &document.operations {
            let binding = spec.action.binding();
            match spec.scope {
                Scope::Once => {
                    let mut bindings = Bindings::new().with_defaults(&self.vars);
                    bindings.insert("binding", binding);
                    ops.push(self.bind(spec, spec.label.clone(), bindings));
                }
                Scope::PerVariant => {
                    for variant in &self.variants {
                        let bindings =
                            Bindings::for_variant(variant, binding).with_defaults(&self.vars);
                        let label = format!("{} [{}]", spec.label, variant.id);
                        ops.push(self.bind(spec, label, bindings));
                    }
                }
            }
        }
        ops
    }

    fn bind(&self, spec: &OperationSpec, label: String, bindings: Bindings) -> Operation {
        Operation::new(label, spec.anchor.clone(), spec.action.clone())
            .with_bindings(bindings.with_expiry())
            .with_variants(self.variants.clone())
    }
}
