use crate::formats::{classify_path, ExtensionClass, SourceFormat};
use crate::job::is_temp_file;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, FilterEntry, WalkDir};

type EntryFilter = Box<dyn FnMut(&DirEntry) -> bool + Send>;

/// An eligible input image discovered by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub size: u64,
}

/// One source-to-destination unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeJob {
    pub source: SourceFile,
    pub destination: PathBuf,
    pub ceiling_bytes: u64,
}

/// Walks a source tree and yields a [`ResizeJob`] per eligible image.
#[derive(Debug, Clone)]
pub struct Enumerator {
    source_dir: PathBuf,
    dest_dir: PathBuf,
    ceiling_bytes: u64,
}

impl Enumerator {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
        ceiling_bytes: u64,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            ceiling_bytes,
        }
    }

    /// Starts a fresh walk. The returned iterator is single-pass.
    ///
    /// A destination nested inside the source tree is pruned from the walk,
    /// so earlier outputs are never picked up as inputs. Directory links are
    /// not followed; file links are.
    pub fn jobs(self) -> Jobs {
        let excluded = self.dest_dir.canonicalize().ok();
        let walker = WalkDir::new(&self.source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(Box::new(move |entry: &DirEntry| {
                !is_excluded(entry, excluded.as_deref())
            }) as EntryFilter);
        Jobs {
            walker,
            source_dir: self.source_dir,
            dest_dir: self.dest_dir,
            ceiling_bytes: self.ceiling_bytes,
        }
    }
}

/// Lazy job sequence produced by [`Enumerator::jobs`]
pub struct Jobs {
    walker: FilterEntry<walkdir::IntoIter, EntryFilter>,
    source_dir: PathBuf,
    dest_dir: PathBuf,
    ceiling_bytes: u64,
}

impl Iterator for Jobs {
    type Item = ResizeJob;

    fn next(&mut self) -> Option<ResizeJob> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }
            if is_temp_file(path) {
                continue;
            }

            let format = match classify_path(path) {
                ExtensionClass::Allowed(format) => format,
                ExtensionClass::Denied => {
                    info!("Skipping PDF file: {}", path.display());
                    continue;
                }
                ExtensionClass::Ignored => continue,
            };

            // Follows links, unlike `DirEntry::metadata`.
            let metadata = match fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                debug!("Not following directory link {}", path.display());
                continue;
            }
            let size = metadata.len();

            let Some(destination) = mirror_path(path, &self.source_dir, &self.dest_dir) else {
                warn!("Skipping {}: outside of {}", path.display(), self.source_dir.display());
                continue;
            };

            return Some(ResizeJob {
                source: SourceFile {
                    path: path.to_path_buf(),
                    format,
                    size,
                },
                destination,
                ceiling_bytes: self.ceiling_bytes,
            });
        }
    }
}

fn is_excluded(entry: &DirEntry, excluded: Option<&Path>) -> bool {
    let Some(excluded) = excluded else {
        return false;
    };
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    match entry.path().canonicalize() {
        Ok(path) if path == excluded => {
            debug!("Skipping destination directory {}", entry.path().display());
            true
        }
        _ => false,
    }
}

/// `dest_dir` joined with `source` relative to `source_dir`.
pub fn mirror_path(source: &Path, source_dir: &Path, dest_dir: &Path) -> Option<PathBuf> {
    source
        .strip_prefix(source_dir)
        .ok()
        .map(|relative| dest_dir.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap().write_all(contents).unwrap();
    }

    #[test]
    fn test_mirror_path() {
        let result = mirror_path(
            Path::new("/photos/2023/beach/a.png"),
            Path::new("/photos"),
            Path::new("/out"),
        );
        assert_eq!(result, Some(PathBuf::from("/out/2023/beach/a.png")));

        assert_eq!(
            mirror_path(Path::new("/elsewhere/a.png"), Path::new("/photos"), Path::new("/out")),
            None
        );
    }

    #[test]
    fn test_jobs_filter_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        touch(&src.join("a.png"), b"png");
        touch(&src.join("b.pdf"), b"pdf");
        touch(&src.join("c.JPG"), b"jpg");
        touch(&src.join("notes.txt"), b"txt");

        let jobs: Vec<_> = Enumerator::new(&src, temp_dir.path().join("out"), 1024)
            .jobs()
            .collect();

        let names: Vec<_> = jobs
            .iter()
            .map(|j| j.source.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "c.JPG"]);
        assert_eq!(jobs[1].source.format, SourceFormat::Jpeg);
    }

    #[test]
    fn test_jobs_recurse_and_mirror_tree() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let out = temp_dir.path().join("out");
        touch(&src.join("top.gif"), b"gif");
        touch(&src.join("nested/deeper/img.webp"), b"webp!");

        let jobs: Vec<_> = Enumerator::new(&src, &out, 2048).jobs().collect();
        assert_eq!(jobs.len(), 2);

        let nested = jobs
            .iter()
            .find(|j| j.source.format == SourceFormat::WebP)
            .unwrap();
        assert_eq!(nested.destination, out.join("nested/deeper/img.webp"));
        assert_eq!(nested.source.size, 5);
        assert_eq!(nested.ceiling_bytes, 2048);
    }

    #[test]
    fn test_destinations_are_unique() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        for name in ["x/a.png", "y/a.png", "a.png", "a.jpg"] {
            touch(&src.join(name), b"data");
        }

        let jobs: Vec<_> = Enumerator::new(&src, temp_dir.path().join("out"), 1).jobs().collect();
        let mut destinations: Vec<_> = jobs.iter().map(|j| j.destination.clone()).collect();
        destinations.sort();
        destinations.dedup();
        assert_eq!(destinations.len(), 4);
    }

    #[test]
    fn test_destination_inside_source_is_pruned() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let out = src.join("out");
        touch(&src.join("a.png"), b"png");
        touch(&out.join("a.png"), b"previous output");
        touch(&out.join("out/a.png"), b"older output");

        let jobs: Vec<_> = Enumerator::new(&src, &out, 1).jobs().collect();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].source.path, src.join("a.png"));
        assert_eq!(jobs[0].destination, out.join("a.png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_followed() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let real = temp_dir.path().join("elsewhere/real.png");
        touch(&real, b"twelve bytes");
        fs::create_dir_all(&src).unwrap();
        symlink(&real, src.join("link.png")).unwrap();
        symlink(temp_dir.path().join("elsewhere"), src.join("linked-dir")).unwrap();

        let jobs: Vec<_> = Enumerator::new(&src, temp_dir.path().join("out"), 1)
            .jobs()
            .collect();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].source.path, src.join("link.png"));
        assert_eq!(jobs[0].source.size, 12);
        assert_eq!(jobs[0].source.format, SourceFormat::Png);
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let jobs = Enumerator::new(temp_dir.path(), temp_dir.path().join("out"), 1).jobs();
        assert_eq!(jobs.count(), 0);
    }
}
