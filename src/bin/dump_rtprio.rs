//! dump_rtprio - print scheduling settings of every task as CSV.
//!
//! Usage:
//!   dump_rtprio                     # scan /proc, CSV on stdout
//!   dump_rtprio --proc-path /host/proc
//!   dump_rtprio -v                  # log scan progress to stderr
//!
//! Columns: exe,name,cpumask,policy,nice,priority,tid,pid,ppid,sid,cpu

use std::io::{self, BufWriter};
use std::process::ExitCode;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{Level, error};
use tracing_subscriber::EnvFilter;

use dump_rtprio::collector::{Collector, RealFs, RealScheduler};
use dump_rtprio::run_scan;

/// Print the scheduling policy, real-time priority, nice value and CPU
/// affinity of every process and thread.
#[derive(Parser)]
#[command(
    name = "dump_rtprio",
    version,
    after_help = "Environment:\n  RUST_LOG  tracing filter directives; overrides the level set by -v/-q"
)]
struct Args {
    /// Path to /proc filesystem. Must be mounted in this process's pid
    /// namespace, since scheduler queries resolve pids there.
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace). Default
    /// only reports warnings and fatal errors.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber on stderr; stdout carries the CSV.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let collector = Collector::new(RealFs::new(), RealScheduler::new(), &args.proc_path);
    let mut out = BufWriter::new(io::stdout().lock());

    match run_scan(&collector, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
