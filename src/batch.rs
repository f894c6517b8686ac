//! Corpus-level processing
//!
//! Files are independent, so they are classified on a rayon pool and their
//! per-item summaries are reduced into one `RunSummary` at the end.

use crate::config::Config;
use crate::error::{FilterError, Result as FilterResult};
use crate::midi::file_name;
use crate::report::{BatchReport, ItemOutcome, RunSummary};
use crate::validator::RejectReason;
use crate::SequenceFilter;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Runs the filter over every sequence file in a directory
#[derive(Debug, Clone)]
pub struct BatchRunner {
    filter: SequenceFilter,
    dry_run: bool,
}

impl BatchRunner {
    pub fn new(config: Config) -> Self {
        Self {
            filter: SequenceFilter::new(config),
            dry_run: false,
        }
    }

    /// Classify without writing any output
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &Config {
        self.filter.config()
    }

    /// Process the configured input directory.
    ///
    /// Only a missing input directory or an uncreatable output directory
    /// fails the run; every per-file problem is tallied instead.
    pub fn run(&self) -> FilterResult<BatchReport> {
        let io = &self.config().io;
        let files = collect_inputs(&io.input_dir, self.config())?;

        if !self.dry_run {
            std::fs::create_dir_all(&io.output_dir).map_err(|e| {
                FilterError::OutputDirError(format!("{}: {}", io.output_dir.display(), e))
            })?;
            debug!("Output directory ready: {}", io.output_dir.display());
        }

        let jobs = self.config().batch.effective_jobs();
        info!(
            "Filtering {} files from {} (jobs={})",
            files.len(),
            io.input_dir.display(),
            jobs
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| FilterError::IoError(format!("failed to build worker pool: {}", e)))?;

        // Indexed collect keeps file order
        let items: Vec<ItemOutcome> =
            pool.install(|| files.par_iter().map(|path| self.process_file(path)).collect());

        let summary = items
            .par_iter()
            .map(RunSummary::from_outcome)
            .reduce(RunSummary::default, RunSummary::merge);

        Ok(BatchReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            input_dir: io.input_dir.display().to_string(),
            output_dir: io.output_dir.display().to_string(),
            dry_run: self.dry_run,
            acceptance_percent: summary.acceptance_percent(),
            summary,
            items,
        })
    }

    /// Push one file through decode, align, validate and write
    pub fn process_file(&self, path: &Path) -> ItemOutcome {
        let file = file_name(path);

        let classified = match self.filter.classify(path) {
            Ok(classified) => classified,
            Err(err) => {
                let reason = RejectReason::from_error(&err).unwrap_or(RejectReason::DecodeError);
                warn!("{}: discarded ({}) - {}", file, reason.describe(), err);
                return ItemOutcome {
                    file,
                    accepted: false,
                    reason: Some(reason),
                    metrics: None,
                    written: false,
                    error: Some(err.to_string()),
                };
            }
        };

        let verdict = classified.verdict;
        debug!(
            "{}: cutoff {:.3}s ({} trimmed, {} removed, {} truncated), metrics {:?}",
            file,
            classified.alignment.cutoff,
            classified.alignment.trimmed.name(),
            classified.alignment.removed,
            classified.alignment.truncated,
            verdict.metrics
        );

        if let Some(reason) = verdict.reason {
            info!("{}: discarded - {}", file, reason.describe());
            return ItemOutcome {
                file,
                accepted: false,
                reason: Some(reason),
                metrics: Some(verdict.metrics),
                written: false,
                error: None,
            };
        }

        let mut outcome = ItemOutcome {
            file,
            accepted: true,
            reason: None,
            metrics: Some(verdict.metrics),
            written: false,
            error: None,
        };

        if self.dry_run {
            info!("{}: accepted (dry run)", outcome.file);
            return outcome;
        }

        match self
            .filter
            .write(&classified.sequence, &self.config().io.output_dir)
        {
            Ok(()) => {
                info!("{}: accepted", outcome.file);
                outcome.written = true;
            }
            Err(err) => {
                warn!("{}: accepted but not written - {}", outcome.file, err);
                outcome.error = Some(err.to_string());
            }
        }
        outcome
    }
}

/// Sequence files directly inside `dir`, sorted by name
pub fn collect_inputs(dir: &Path, config: &Config) -> FilterResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(FilterError::InputDirMissing(dir.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && config.io.matches_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
