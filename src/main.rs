use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod inventory;
mod plan;
mod rebuild;
mod report;
#[cfg(test)]
mod testing;
mod toolchain;
mod util;
mod workflow;

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    init_tracing(args.verbose);
    workflow::run(args)
}

/// Log to stderr; `RUST_LOG` overrides the verbosity chosen on the command line.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "rebuild_gobin=debug"
    } else {
        "rebuild_gobin=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
