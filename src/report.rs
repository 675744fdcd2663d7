use crate::archive::ArchiveSummary;
use crate::constants::{INFO_PREFIX, SIZE_PREFIX, SUCCESS_PREFIX, WARNING_PREFIX};
use crate::enumerator::ResizeJob;
use crate::job::ResizeOutcome;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Modified,
    Unmodified,
}

/// Only a strictly smaller output counts as modified; failures are
/// reported as unmodified.
pub fn classify(outcome: &ResizeOutcome) -> Classification {
    match outcome {
        ResizeOutcome::Shrunk { .. } => Classification::Modified,
        ResizeOutcome::NotShrunk { .. } | ResizeOutcome::Failed(_) => Classification::Unmodified,
    }
}

/// A job that produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Source paths in completion order
    pub modified: Vec<PathBuf>,
    /// Source paths in completion order, followed by abandoned jobs
    pub unmodified: Vec<PathBuf>,
    /// Subset of `unmodified` that failed
    pub failed: Vec<FailedFile>,
    /// Subset of `unmodified` cut off by the deadline
    pub abandoned: Vec<PathBuf>,
    pub archive: Option<ArchiveSummary>,
    pub deadline_exceeded: bool,
    pub elapsed: Duration,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.modified.len() + self.unmodified.len()
    }

    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_before == 0 {
            return 0.0;
        }
        ((self.bytes_before as f64 - self.bytes_after as f64) / self.bytes_before as f64) * 100.0
    }
}

/// Builds a [`RunReport`] one outcome at a time.
#[derive(Debug, Default)]
pub struct Aggregator {
    report: RunReport,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, job: &ResizeJob, outcome: &ResizeOutcome) -> Classification {
        let path = job.source.path.clone();

        if let Some((before, after)) = outcome.sizes() {
            self.report.bytes_before += before;
            self.report.bytes_after += after;
        }

        if let ResizeOutcome::Failed(e) = outcome {
            warn!("Error processing {}: {}", path.display(), e);
            self.report.failed.push(FailedFile {
                path: path.clone(),
                error: e.to_string(),
            });
        }

        let classification = classify(outcome);
        match classification {
            Classification::Modified => self.report.modified.push(path),
            Classification::Unmodified => self.report.unmodified.push(path),
        }
        classification
    }

    pub fn record_abandoned(&mut self, job: &ResizeJob) {
        self.report.abandoned.push(job.source.path.clone());
        self.report.unmodified.push(job.source.path.clone());
    }

    pub fn finish(
        mut self,
        deadline_exceeded: bool,
        elapsed: Duration,
        archive: Option<ArchiveSummary>,
    ) -> RunReport {
        self.report.deadline_exceeded = deadline_exceeded;
        self.report.elapsed = elapsed;
        self.report.archive = archive;
        self.report
    }
}

pub fn print_report(report: &RunReport) {
    if let Some(archive) = &report.archive {
        println!(
            "{} The resized images have been saved in {}",
            SUCCESS_PREFIX,
            archive.path.display()
        );
    }

    println!("\nList of modified images:");
    for path in &report.modified {
        println!("{}", path.display());
    }

    println!("\nList of unmodified images:");
    for path in &report.unmodified {
        println!("{}", path.display());
    }

    println!("\n{} Summary:", SIZE_PREFIX);
    println!("  📁 Files seen: {}", report.total());
    println!("  ✂️  Modified: {}", report.modified.len());
    println!("  📎 Unmodified: {}", report.unmodified.len());
    if !report.failed.is_empty() {
        println!("  {}  Failed: {}", WARNING_PREFIX, report.failed.len());
    }
    if !report.abandoned.is_empty() {
        println!("  {}  Not finished before timeout: {}", WARNING_PREFIX, report.abandoned.len());
    }
    println!("  📊 Total original size: {} bytes", report.bytes_before);
    println!("  📊 Total resized size: {} bytes", report.bytes_after);
    println!("  🎯 Overall compression ratio: {:.1}%", report.compression_ratio());
    println!("  ⏱️  Processing time: {:?}", report.elapsed);
    if let Some(archive) = &report.archive {
        println!("  {} Archive entries: {}", INFO_PREFIX, archive.entries);
    }
    if report.deadline_exceeded {
        println!("  {}  Timeout exceeded, results are partial", WARNING_PREFIX);
    }
}
