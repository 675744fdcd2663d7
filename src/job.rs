use crate::budget::fit_to_budget;
use crate::codec::{decode, normalize_color_mode, DecodeMode};
use crate::constants::TEMP_FILE_PREFIX;
use crate::enumerator::ResizeJob;
use crate::error::{ResizeError, Result};
use std::fs;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Terminal result of one [`ResizeJob`]
#[derive(Debug)]
pub enum ResizeOutcome {
    /// Output is strictly smaller than the source
    Shrunk {
        source_size: u64,
        output_size: u64,
        quality: u8,
    },
    NotShrunk {
        source_size: u64,
        output_size: u64,
        quality: u8,
    },
    Failed(ResizeError),
}

impl ResizeOutcome {
    fn from_sizes(source_size: u64, output_size: u64, quality: u8) -> Self {
        if output_size < source_size {
            ResizeOutcome::Shrunk {
                source_size,
                output_size,
                quality,
            }
        } else {
            ResizeOutcome::NotShrunk {
                source_size,
                output_size,
                quality,
            }
        }
    }

    /// `(source_size, output_size)` for jobs that produced an output.
    pub fn sizes(&self) -> Option<(u64, u64)> {
        match self {
            ResizeOutcome::Shrunk {
                source_size,
                output_size,
                ..
            }
            | ResizeOutcome::NotShrunk {
                source_size,
                output_size,
                ..
            } => Some((*source_size, *output_size)),
            ResizeOutcome::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResizeOutcome::Failed(_))
    }
}

/// Per-run knobs that every job shares
#[derive(Debug, Clone, Copy, Default)]
pub struct JobSettings {
    pub decode_mode: DecodeMode,
}

/// Executes a job end to end. Never panics and never returns an error:
/// every failure, including a codec panic, becomes [`ResizeOutcome::Failed`].
pub fn process_job(job: &ResizeJob, settings: JobSettings) -> ResizeOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| resize_to_budget(job, settings))) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => ResizeOutcome::Failed(e),
        Err(_) => ResizeOutcome::Failed(ResizeError::Panicked(job.source.path.clone())),
    }
}

/// decode -> normalize -> fit -> save
fn resize_to_budget(job: &ResizeJob, settings: JobSettings) -> Result<ResizeOutcome> {
    let source_path = &job.source.path;
    let source_size = fs::metadata(source_path)?.len();

    let image = decode(source_path, job.source.format.image_format(), settings.decode_mode)?;
    let image = normalize_color_mode(image);
    let fitted = fit_to_budget(&image, job.ceiling_bytes)?;

    write_atomically(&job.destination, &fitted.bytes)?;
    let output_size = fitted.len();

    debug!(
        "{} -> {}: {} -> {} bytes at quality {}",
        source_path.display(),
        job.destination.display(),
        source_size,
        output_size,
        fitted.quality
    );

    Ok(ResizeOutcome::from_sizes(source_size, output_size, fitted.quality))
}

/// Writes through a temp file in the destination directory so the final
/// path only ever holds a complete file. The temp file name starts with
/// [`TEMP_FILE_PREFIX`].
fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| ResizeError::write(parent, e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(parent)
        .map_err(|e| ResizeError::write(destination, e))?;
    temp.write_all(bytes)
        .map_err(|e| ResizeError::write(destination, e))?;
    temp.persist(destination)
        .map_err(|e| ResizeError::write(destination, e.error))?;
    Ok(())
}

pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEMP_FILE_PREFIX))
}

/// Deletes temp files left under `dir` by jobs that never finished, such as
/// those abandoned at the deadline when the process exited. Returns how many
/// were removed.
pub fn remove_stale_temp_files(dir: &Path) -> usize {
    let mut removed = 0;
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !is_temp_file(entry.path()) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!("Removed stale temp file {}", entry.path().display());
                removed += 1;
            }
            Err(e) => warn!("Could not remove {}: {}", entry.path().display(), e),
        }
    }
    removed
}
