mod cli;
mod config;
mod logging;

use anyhow::Context;
use clap::Parser;
use sw_engine::{report, write_json, ExperimentRunner, MarkerExtractor, ProcessInvoker, ResultStore};
use sw_optimizer::GridSearch;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::config::SweepConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("annealsweep v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let config = SweepConfig::resolve(&cli)?;
    let grid = GridSearch::new(config.space.clone())?;
    let invoker = ProcessInvoker::new(&config.solver, config.instance.clone())
        .with_timeout(config.timeout)
        .with_scratch_root(config.scratch_dir.clone());

    if cli.dry_run {
        println!("{} configurations:", grid.len());
        for (index, configuration) in grid.configurations().iter().enumerate() {
            println!("{:>5}  {}", index + 1, invoker.command_line(configuration));
        }
        return Ok(());
    }

    let extractor = MarkerExtractor::new(&config.score_marker)?;
    let runner = ExperimentRunner::new(invoker, extractor).with_workers(config.workers);
    let sweep = runner.run(&grid)?;

    let store = ResultStore::new(&config.output);
    let summary = report(&sweep.dataset, &store)
        .with_context(|| format!("failed to write results to {}", store.path().display()))?;

    if let Some(path) = &config.summary_json {
        write_json(&sweep, path)
            .with_context(|| format!("failed to write sweep summary to {}", path.display()))?;
        info!("Sweep summary written to {}", path.display());
    }

    println!();
    println!("{summary}");
    Ok(())
}
