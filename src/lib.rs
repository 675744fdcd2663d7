pub mod archive;
pub mod batch;
pub mod budget;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod enumerator;
pub mod error;
pub mod formats;
pub mod job;
pub mod logger;
pub mod report;
pub mod scheduler;

pub use archive::{archive, entry_name, ArchiveSummary};
pub use batch::run;
pub use budget::{fit_to_budget, FittedImage};
pub use codec::{decode, encode, normalize_color_mode, DecodeMode};
pub use config::RunConfig;
pub use enumerator::{mirror_path, Enumerator, Jobs, ResizeJob, SourceFile};
pub use error::{ResizeError, Result};
pub use formats::{classify_path, ExtensionClass, SourceFormat};
pub use job::{is_temp_file, process_job, remove_stale_temp_files, JobSettings, ResizeOutcome};
pub use report::{classify, print_report, Aggregator, Classification, FailedFile, RunReport};
pub use scheduler::{ScheduleResult, Scheduler, SchedulerOptions};
