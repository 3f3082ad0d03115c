use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log_grouper::{Config, DEFAULT_EXTENSION, DEFAULT_WORKERS, run, setup_logging};
use tracing::info;

/// Groups pipe-delimited log lines by their group field into one JSON-lines file per group.
#[derive(Parser, Debug)]
#[command(name = "log-grouper", version)]
struct Args {
    /// Number of parsing workers per log file
    #[arg(short = 'w', long = "worker-number", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Number of files processed at the same time [default: number of cores]
    #[arg(long)]
    file_tasks: Option<usize>,

    /// Directory which is searched recursively for log files
    #[arg(short, long, default_value = "data/input")]
    input_dir: PathBuf,

    /// Directory receiving the grouped output files
    #[arg(short, long, default_value = "data/output")]
    output_dir: PathBuf,

    /// Extension of the files treated as input
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Capacity of the pipeline channels (0: rendezvous)
    #[arg(long, default_value_t = 0)]
    channel_capacity: usize,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let config = Config::new(args.input_dir, args.output_dir)
            .with_workers(args.workers)
            .with_extension(args.extension)
            .with_channel_capacity(args.channel_capacity);
        match args.file_tasks {
            Some(file_tasks) => config.with_file_tasks(file_tasks),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    let config = Config::from(Args::parse());
    setup_logging()?;

    let started = Instant::now();
    info!(
        workers = config.workers,
        file_tasks = config.file_tasks,
        "process is starting"
    );

    let summary = run(&config)?;

    info!(
        records = summary.records,
        groups = summary.groups,
        skipped_files = summary.skipped_files,
        dropped_lines = summary.dropped_lines,
        elapsed = ?started.elapsed(),
        "process completed successfully"
    );
    Ok(())
}
