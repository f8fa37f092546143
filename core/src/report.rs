//! # Run Reports
//!
//! Aggregates per-operation results of a run for console output.

use crate::patcher::{Outcome, PatchResult};
use serde::Serialize;
use std::fmt::Display;

/// Results of one run over any number of documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Every result, in execution order.
    pub results: Vec<PatchResult>,
}

impl Report {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends results.
    pub fn extend(&mut self, results: impl IntoIterator<Item = PatchResult>) {
        self.results.extend(results);
    }

    /// Results that changed a document.
    pub fn applied(&self) -> impl Iterator<Item = &PatchResult> {
        self.results.iter().filter(|r| r.applied)
    }

    /// Results whose anchor was absent.
    pub fn missing(&self) -> impl Iterator<Item = &PatchResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == Outcome::AnchorNotFound)
    }

    /// Results that failed.
    pub fn failed(&self) -> impl Iterator<Item = &PatchResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
    }

    /// True if any result changed a document.
    pub fn changed(&self) -> bool {
        self.applied().next().is_some()
    }

    /// True if nothing was missing or failed.
    pub fn is_clean(&self) -> bool {
        self.missing().next().is_none() && self.failed().next().is_none()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut current: Option<&str> = None;
        for r in &self.results {
            if current != Some(r.document_id.as_str()) {
                writeln!(f, "{}", r.document_id)?;
                current = Some(r.document_id.as_str());
            }
            let mark = match r.outcome {
                Outcome::Applied => '+',
                Outcome::AlreadyApplied => '=',
                Outcome::AnchorNotFound => '?',
                Outcome::Failed(_) => '!',
            };
            writeln!(
                f,
                "  {} {} ({} match{}): {}",
                mark,
                r.label,
                r.match_count,
                if r.match_count == 1 { "" } else { "es" },
                r.outcome
            )?;
        }
        write!(
            f,
            "{} applied, {} missing, {} failed, {} total",
            self.applied().count(),
            self.missing().count(),
            self.failed().count(),
            self.results.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(doc: &str, label: &str, outcome: Outcome, count: usize) -> PatchResult {
        PatchResult {
            document_id: doc.into(),
            label: label.into(),
            applied: outcome == Outcome::Applied,
            match_count: count,
            outcome,
        }
    }

    #[test]
    fn test_summary_and_display() {
        let mut report = Report::new();
        report.extend(vec![
            result("a.tsx", "state [B01]", Outcome::Applied, 1),
            result("a.tsx", "state [B02]", Outcome::AnchorNotFound, 0),
            result("b.tsx", "receipt", Outcome::Failed("boom".into()), 0),
        ]);

        assert!(report.changed());
        assert!(!report.is_clean());
        assert_eq!(report.missing().count(), 1);

        let text = report.to_string();
        assert_eq!(
            text,
            "a.tsx
  + state [B01] (1 match): applied
  ? state [B02] (0 matches): anchor not found
b.tsx
  ! receipt (0 matches): failed: boom
1 applied, 1 missing, 1 failed, 3 total"
        );
    }
}
