use crate::archive::archive;
use crate::config::RunConfig;
use crate::constants::{PROGRESS_BAR_CHARS, PROGRESS_BAR_TEMPLATE};
use crate::enumerator::{Enumerator, ResizeJob};
use crate::error::{ResizeError, Result};
use crate::job::{process_job, remove_stale_temp_files, JobSettings};
use crate::report::{Aggregator, RunReport};
use crate::scheduler::{Scheduler, SchedulerOptions};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use tracing::{info, warn};

/// Resizes every eligible image under `config.source_dir`, zips the
/// outputs and returns the modified/unmodified report.
///
/// Configuration and archive-write failures abort the run. Anything that
/// goes wrong with an individual file ends up in the report instead, and a
/// missed deadline still produces an archive of whatever was finished.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    config.validate()?;

    info!("🚀 Starting batch resize...");
    info!("📁 Input: {}", config.source_dir.display());
    info!("📁 Output: {}", config.dest_dir.display());

    fs::create_dir_all(&config.dest_dir).map_err(|e| ResizeError::write(&config.dest_dir, e))?;
    let stale = remove_stale_temp_files(&config.dest_dir);
    if stale > 0 {
        info!("🧹 Removed {} leftover temp file(s) from an earlier run", stale);
    }

    let jobs: Vec<ResizeJob> =
        Enumerator::new(&config.source_dir, &config.dest_dir, config.ceiling_bytes())
            .jobs()
            .collect();
    let total_files = jobs.len();

    if total_files == 0 {
        warn!("⚠️  No image files found in {}", config.source_dir.display());
    } else {
        info!(
            "📊 Found {} image files, ceiling {} KB, timeout {}s",
            total_files, config.max_size_kb, config.timeout_secs
        );
    }

    let progress = progress_bar(total_files as u64, config.show_progress);

    let settings = JobSettings {
        decode_mode: config.decode_mode,
    };
    let scheduler = Scheduler::new(
        SchedulerOptions::new(config.deadline())
            .with_workers(config.workers)
            .with_grace(config.grace()),
    );

    let mut aggregator = Aggregator::new();
    let schedule = scheduler.run(
        jobs.clone(),
        move |job| process_job(job, settings),
        |job, outcome| {
            aggregator.record(job, outcome);
            progress.inc(1);
        },
    )?;

    if schedule.deadline_exceeded {
        progress.abandon_with_message("timeout exceeded");
    } else {
        progress.finish_with_message("done");
    }

    for job in &schedule.abandoned {
        aggregator.record_abandoned(job);
    }

    let summary = archive(&jobs, &config.archive_path, &config.dest_dir)?;

    // Abandoned jobs may still be writing; whatever they left so far goes.
    if schedule.deadline_exceeded {
        remove_stale_temp_files(&config.dest_dir);
    }

    Ok(aggregator.finish(schedule.deadline_exceeded, schedule.elapsed, Some(summary)))
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_BAR_CHARS);
    pb.set_style(style);
    pb.set_message("Processing images");
    pb
}
