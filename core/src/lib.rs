#![deny(missing_docs)]

//! # NCF Patch Core
//!
//! Structural patch engine for front-end sources: finds bounded anchors in a
//! document, splices generated fragments or record fields next to them, and
//! reports what happened per operation. Also hosts the shared expiry-urgency
//! classifier used by every surface that shows an NCF expiry date.

/// Shared error types.
pub mod error;

/// Anchor matching.
pub mod anchor;

/// Fragment templates.
pub mod template;

/// Variant catalogue entries.
pub mod variant;

/// Expiry-urgency classification.
pub mod expiry;

/// Record schemas and literal extension.
pub mod schema;

/// Patch orchestration.
pub mod patcher;

/// YAML patch plans.
pub mod plan;

/// Run reports.
pub mod report;

pub use anchor::{find_anchors, locate, AnchorPattern, Capture, Match};
pub use error::{AppError, AppResult};
pub use expiry::{classify, ExpiryBand, ExpiryStatus};
pub use patcher::{
    apply_all, Action, AnchorSpec, Applied, Operation, Outcome, PatchResult, Position, Repeat,
};
pub use plan::{DocumentPlan, OperationSpec, PatchPlan, Scope};
pub use report::Report;
pub use schema::{FieldAddition, RecordLiteral, RecordSchema};
pub use template::{render, Bindings, Template};
pub use variant::VariantSpec;
