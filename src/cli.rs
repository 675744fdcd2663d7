use crate::codec::DecodeMode;
use crate::config::RunConfig;
use crate::constants::{
    DEFAULT_ARCHIVE_NAME, DEFAULT_GRACE_SECS, DEFAULT_MAX_SIZE_KB, DEFAULT_TIMEOUT_SECS,
};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "budget-resize",
    about = "Recompress a directory of images to fit a size budget and zip the results",
    long_about = "budget-resize walks a directory tree, re-encodes every JPEG, PNG, GIF, BMP, TIFF, \
                  WebP and HEIC file as JPEG at the highest quality that fits under the size limit, \
                  mirrors the results into a destination directory and packs them into a zip archive. \
                  PDF files are skipped. At the end it lists which files got smaller and which did not.",
    version,
    after_help = "EXAMPLES:\n  \
    budget-resize ./photos -d ./resized\n  \
    budget-resize ./photos -d ./resized -s 250 -t 600 -o photos.zip\n  \
    budget-resize ./scans -d ./out -j 4 --grace 30 --strict-decode"
)]
pub struct Args {
    #[arg(help = "Directory containing the images to process")]
    pub source: PathBuf,

    #[arg(
        short = 'd',
        long = "dest",
        help = "Directory for the processed images",
        long_help = "Directory that receives a mirrored copy of the source tree with every \
                     eligible image re-encoded. Created if missing."
    )]
    pub dest: PathBuf,

    #[arg(
        short = 's',
        long,
        default_value_t = DEFAULT_MAX_SIZE_KB,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Maximum size per image in KB",
        long_help = "Target ceiling for each output file in KB (1 KB = 1024 bytes). \
                     Quality steps down from 95 to 10 until the file fits; images that \
                     still exceed it at quality 10 are kept at quality 10."
    )]
    pub max_size_kb: u64,

    #[arg(
        short = 't',
        long,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Timeout in seconds",
        long_help = "Wall-clock limit for processing. No new image is started after it \
                     expires; whatever finished is still archived."
    )]
    pub timeout: u64,

    #[arg(
        short = 'o',
        long,
        default_value = DEFAULT_ARCHIVE_NAME,
        help = "Output zip file"
    )]
    pub output_zip: PathBuf,

    #[arg(
        short = 'j',
        long,
        help = "Number of parallel threads (default: auto)",
        long_help = "Number of worker threads. If not specified, uses the number of CPU cores."
    )]
    pub threads: Option<usize>,

    #[arg(
        long,
        default_value_t = DEFAULT_GRACE_SECS,
        help = "Seconds to wait for running images after the timeout",
        long_help = "After the timeout, keep collecting images that were already being \
                     processed for this many seconds before abandoning them."
    )]
    pub grace: u64,

    #[arg(
        long,
        help = "Fail truncated or corrupt images instead of keeping what decodes",
        long_help = "By default a damaged image whose header is readable is processed with \
                     the pixels that could be decoded. With this flag such images fail instead."
    )]
    pub strict_decode: bool,

    #[arg(short = 'v', long, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        help = "Only print warnings and the final report",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Args {
    pub fn to_config(&self) -> RunConfig {
        let decode_mode = if self.strict_decode {
            DecodeMode::Strict
        } else {
            DecodeMode::Tolerant
        };

        let mut config = RunConfig::new(
            &self.source,
            self.max_size_kb,
            self.timeout,
            &self.output_zip,
            &self.dest,
        )
        .with_grace_secs(self.grace)
        .with_decode_mode(decode_mode)
        .with_progress(!self.quiet);

        if let Some(threads) = self.threads {
            config = config.with_workers(threads);
        }
        config
    }
}
