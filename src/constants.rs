/// Highest JPEG quality tried by the budget search.
pub const MAX_QUALITY: u8 = 95;
/// Lowest JPEG quality; the search stops here even if the ceiling is missed.
pub const MIN_QUALITY: u8 = 10;
pub const QUALITY_STEP: u8 = 5;
/// `(MAX_QUALITY - MIN_QUALITY) / QUALITY_STEP + 1`
pub const MAX_ENCODE_ATTEMPTS: usize = 18;

pub const BYTES_PER_KB: u64 = 1024;

pub const DEFAULT_MAX_SIZE_KB: u64 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_GRACE_SECS: u64 = 0;
pub const DEFAULT_ARCHIVE_NAME: &str = "resized_images.zip";

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "heic", "heif",
];
pub const DENIED_EXTENSIONS: &[&str] = &["pdf"];

/// Name prefix of in-progress output files
pub const TEMP_FILE_PREFIX: &str = ".budget-resize-";

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
pub const PROGRESS_BAR_CHARS: &str = "=>-";

// Common output message prefixes
pub const SUCCESS_PREFIX: &str = "✅";
pub const WARNING_PREFIX: &str = "⚠️";
pub const INFO_PREFIX: &str = "📋";
pub const SIZE_PREFIX: &str = "📊";
