//! Implements the CLI for apt-diff.

mod cli;
mod conversion;

#[cfg(target_env = "musl")]
use mimalloc::MiMalloc;

#[cfg(target_env = "musl")]
#[cfg_attr(target_env = "musl", global_allocator)]
static GLOBAL: MiMalloc = MiMalloc;

use clap::Parser;
use cli::Cli;
use proc_exit::Code;
use proc_exit::Exit;

fn main() -> eyre::Result<Exit> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config: apt_diff_core::PipelineConfig = match cli.try_into() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            return Ok(Exit::new(Code::new(2)));
        }
    };

    match apt_diff_core::run(&config) {
        // Matches the original's `main()`, which falls off the end (exit 0)
        // regardless of how many discrepancies `execute()` found: the report
        // itself is the output, not the exit code. An empty `--package`/
        // `--path` selection is a warned no-op handled inside `run()`, not a
        // usage error here.
        Ok(_counters) => Ok(Exit::new(Code::SUCCESS)),
        Err(err) => Err(err.into()),
    }
}
