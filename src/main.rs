use anyhow::{Context, Result};
use budget_resize::cli::Args;
use budget_resize::{logger, print_report, run};
use clap::Parser;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.verbose, args.quiet);

    let config = args.to_config();
    let report = run(&config).with_context(|| {
        format!(
            "Failed to resize images from {}",
            config.source_dir.display()
        )
    })?;

    print_report(&report);

    Ok(())
}
