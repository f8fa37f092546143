#![deny(missing_docs)]

//! # Patch Orchestration
//!
//! Runs an ordered batch of operations over one document's text.
//!
//! - **common**: operation, anchor and result types.
//! - **fragments**: fragment insertion next to anchors.
//! - **records**: record literal extension.
//!
//! Each operation sees the output of the previous one. A missing anchor or a failing
//! operation is recorded and the batch continues; a failed operation never leaves a
//! partial splice behind.

pub(crate) mod common;
mod fragments;
mod records;

pub use common::{
    Action, AnchorSpec, Applied, Operation, Outcome, PatchResult, Position, Repeat,
};

use crate::error::AppError;
use common::Step;

/// Applies `operations` in order to `document` and reports each one.
pub fn apply_all(document_id: &str, document: &str, operations: &[Operation]) -> Applied {
    let mut text = document.to_string();
    let mut results = Vec::with_capacity(operations.len());

    for op in operations {
        let step = match &op.action {
            Action::Insert {
                position,
                template,
                repeat,
                ..
            } => fragments::insert_fragment(&text, op, *position, template, repeat.as_ref()),
            Action::ExtendRecord { fields } => records::extend_record(&text, op, fields),
        };

        let step = step.unwrap_or_else(|err| match err {
            AppError::AnchorNotFound { .. } => Step::missing(),
            other => Step {
                text: None,
                match_count: 0,
                outcome: Outcome::Failed(other.to_string()),
            },
        });

        match &step.outcome {
            Outcome::Applied => log::debug!("{}: {} applied", document_id, op.label),
            Outcome::AlreadyApplied => log::debug!("{}: {} already applied", document_id, op.label),
            Outcome::AnchorNotFound => log::warn!("{}: {}: anchor not found", document_id, op.label),
            Outcome::Failed(msg) => log::warn!("{}: {}: {}", document_id, op.label, msg),
        }

        let applied = step.text.is_some();
        if let Some(next) = step.text {
            text = next;
        }

        results.push(PatchResult {
            document_id: document_id.to_string(),
            label: op.label.clone(),
            applied,
            match_count: step.match_count,
            outcome: step.outcome,
        });
    }

    Applied { text, results }
}
