use crate::enumerator::ResizeJob;
use crate::error::Result;
use crate::job::is_temp_file;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub skipped: usize,
}

/// Zips every job output that exists on disk right now.
///
/// Entries are named by their path relative to `dest_dir`, with `/`
/// separators, and are stored uncompressed since the payloads are JPEG.
/// A destination that was never written, or that disappears before it can
/// be read, is skipped. Only failures of the archive itself are errors.
pub fn archive(jobs: &[ResizeJob], archive_path: &Path, dest_dir: &Path) -> Result<ArchiveSummary> {
    if let Some(parent) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    let mut entries = 0;
    let mut skipped = 0;

    for job in jobs {
        if is_temp_file(&job.destination) {
            skipped += 1;
            continue;
        }
        let Some(name) = entry_name(&job.destination, dest_dir) else {
            warn!(
                "{} is not under {}, leaving it out of the archive",
                job.destination.display(),
                dest_dir.display()
            );
            skipped += 1;
            continue;
        };

        let bytes = match fs::read(&job.destination) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No output for {}, skipping", job.source.path.display());
                skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("Could not read {}: {}", job.destination.display(), e);
                skipped += 1;
                continue;
            }
        };

        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
        entries += 1;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;

    info!(
        "Archived {} file(s) into {} ({} skipped)",
        entries,
        archive_path.display(),
        skipped
    );

    Ok(ArchiveSummary {
        path: archive_path.to_path_buf(),
        entries,
        skipped,
    })
}

/// POSIX-style name of `path` relative to `root`.
pub fn entry_name(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
