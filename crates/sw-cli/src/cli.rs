use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    name = "annealsweep",
    version,
    about = "Run an external annealing solver across a grid of hyperparameters and record each run's best score.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Sweep definition in TOML format. Built-in defaults apply when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the solver executable.
    #[arg(long, value_name = "PATH")]
    pub solver: Option<PathBuf>,

    /// Override the problem-instance argument passed to the solver.
    #[arg(long, value_name = "PATH")]
    pub instance: Option<String>,

    /// Override the CSV results file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Number of solver runs to execute concurrently (1 = sequential).
    #[arg(short = 'j', long, value_name = "NUM")]
    pub workers: Option<usize>,

    /// Kill a solver run that exceeds this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Give each run a private working directory under this path
    /// (defaults to `sweep-scratch` next to the output when --workers > 1).
    #[arg(long, value_name = "PATH")]
    pub scratch_dir: Option<PathBuf>,

    /// Also write the sweep status and per-run trials as JSON.
    #[arg(long, value_name = "PATH")]
    pub summary_json: Option<PathBuf>,

    /// Print the generated grid and solver command lines without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase verbosity level (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
