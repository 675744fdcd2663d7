use crate::codec::DecodeMode;
use crate::constants::{BYTES_PER_KB, DEFAULT_GRACE_SECS};
use crate::error::{ResizeError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything one run needs, fixed for its duration
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub max_size_kb: u64,
    pub timeout_secs: u64,
    pub archive_path: PathBuf,
    pub workers: usize,
    pub grace_secs: u64,
    pub decode_mode: DecodeMode,
    pub show_progress: bool,
}

impl RunConfig {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        max_size_kb: u64,
        timeout_secs: u64,
        archive_path: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            max_size_kb,
            timeout_secs,
            archive_path: archive_path.into(),
            workers: num_cpus::get(),
            grace_secs: DEFAULT_GRACE_SECS,
            decode_mode: DecodeMode::default(),
            show_progress: true,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_grace_secs(mut self, grace_secs: u64) -> Self {
        self.grace_secs = grace_secs;
        self
    }

    pub fn with_decode_mode(mut self, decode_mode: DecodeMode) -> Self {
        self.decode_mode = decode_mode;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn ceiling_bytes(&self) -> u64 {
        self.max_size_kb.saturating_mul(BYTES_PER_KB)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    /// Rejects a configuration before any work starts.
    pub fn validate(&self) -> Result<()> {
        if !self.source_dir.exists() {
            return Err(invalid(format!(
                "source directory {:?} does not exist",
                self.source_dir
            )));
        }
        if !self.source_dir.is_dir() {
            return Err(invalid(format!("{:?} is not a directory", self.source_dir)));
        }
        if self.max_size_kb == 0 {
            return Err(invalid("maximum size must be a positive number of KB"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("timeout must be a positive number of seconds"));
        }
        if self.workers == 0 {
            return Err(invalid("worker count must be at least 1"));
        }
        if self.archive_path.as_os_str().is_empty() {
            return Err(invalid("output archive path is empty"));
        }
        if self.dest_dir.as_os_str().is_empty() {
            return Err(invalid("destination directory is empty"));
        }
        if same_directory(&self.source_dir, &self.dest_dir) {
            return Err(invalid(format!(
                "destination {:?} is the source directory; originals would be overwritten",
                self.dest_dir
            )));
        }
        if self.archive_path.is_dir() {
            return Err(invalid(format!(
                "output archive {:?} is a directory",
                self.archive_path
            )));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ResizeError {
    ResizeError::InvalidConfiguration(message.into())
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
