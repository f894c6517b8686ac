//! Run summary and reporting

use crate::validator::{RejectReason, VerdictMetrics};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Result of pushing one file through the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    /// Source file name
    pub file: String,
    pub accepted: bool,
    pub reason: Option<RejectReason>,
    pub metrics: Option<VerdictMetrics>,
    /// Whether the cleaned copy landed on disk
    pub written: bool,
    /// Decode or write failure message, if any
    pub error: Option<String>,
}

/// Per-reason tallies and totals for a run.
///
/// Summaries are values: each item yields its own and they are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub accepted: usize,
    pub written: usize,
    pub write_failures: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl RunSummary {
    /// Summary of a single item
    pub fn from_outcome(outcome: &ItemOutcome) -> Self {
        let mut summary = Self {
            processed: 1,
            ..Self::default()
        };
        if outcome.accepted {
            summary.accepted = 1;
            if outcome.written {
                summary.written = 1;
            } else if outcome.error.is_some() {
                summary.write_failures = 1;
            }
        } else if let Some(reason) = outcome.reason {
            summary.rejected.insert(reason, 1);
        }
        summary
    }

    /// Combine two summaries
    pub fn merge(mut self, other: Self) -> Self {
        self.processed += other.processed;
        self.accepted += other.accepted;
        self.written += other.written;
        self.write_failures += other.write_failures;
        for (reason, count) in other.rejected {
            *self.rejected.entry(reason).or_insert(0) += count;
        }
        self
    }

    pub fn count(&self, reason: RejectReason) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    pub fn discarded(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Accepted share in percent; `None` for an empty corpus
    pub fn acceptance_percent(&self) -> Option<f64> {
        if self.processed == 0 {
            None
        } else {
            Some(self.accepted as f64 / self.processed as f64 * 100.0)
        }
    }

    /// End-of-run table, one row per reason in rule order
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let width = RejectReason::ALL
            .iter()
            .map(|r| r.describe().len())
            .max()
            .unwrap_or(0)
            .max("Acceptance".len());

        let _ = writeln!(out, "{:<width$}  {:>8}", "Discard reason", "Files");
        let _ = writeln!(out, "{}", "-".repeat(width + 10));
        for reason in RejectReason::ALL {
            let _ = writeln!(out, "{:<width$}  {:>8}", reason.describe(), self.count(reason));
        }
        let _ = writeln!(out, "{}", "-".repeat(width + 10));
        let _ = writeln!(out, "{:<width$}  {:>8}", "Discarded", self.discarded());
        let _ = writeln!(out, "{:<width$}  {:>8}", "Processed", self.processed);
        let _ = writeln!(out, "{:<width$}  {:>8}", "Accepted", self.accepted);
        if self.write_failures > 0 {
            let _ = writeln!(out, "{:<width$}  {:>8}", "Write failures", self.write_failures);
        }
        let percent = match self.acceptance_percent() {
            Some(p) => format!("{:.2}%", p),
            None => "n/a".to_string(),
        };
        let _ = writeln!(out, "{:<width$}  {:>8}", "Acceptance", percent);
        out
    }
}

/// Summary plus per-file outcomes, as exported to JSON
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub version: String,
    pub input_dir: String,
    pub output_dir: String,
    pub dry_run: bool,
    pub summary: RunSummary,
    pub acceptance_percent: Option<f64>,
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Export the report as pretty JSON
    pub fn export_json(&self, path: &Path) -> crate::FilterResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Exported run report to {}", path.display());
        Ok(())
    }
}
