use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

mod pipeline;
mod report;
mod resolve;
mod tracked;
mod walk;

use pipeline::Pipeline;
use report::{FilterConfig, Reporter};
use resolve::Resolver;
use tracked::{GitLsFiles, TrackedFileLister};

/// List the CODEOWNERS of every file under the given paths.
#[derive(Parser)]
#[command(name = "codeowners", version)]
struct Cli {
    /// Files or directories to list owners for [default: .]
    paths: Vec<PathBuf>,

    /// Filter results by owner; the leading @ is optional
    #[arg(short = 'o', long = "owner", value_name = "OWNER", value_delimiter = ',')]
    owners: Vec<String>,

    /// Show unowned files (can be combined with -o)
    #[arg(short = 'u', long)]
    unowned: bool,

    /// CODEOWNERS file path [default: .github/CODEOWNERS, CODEOWNERS or docs/CODEOWNERS]
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    codeowners_file: Option<PathBuf>,

    /// Only show files tracked by git
    #[arg(short = 't', long)]
    tracked: bool,

    /// Enable info-level logging to stderr
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Enable debug-level logging to stderr
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn root_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        }
    }

    fn filter_config(&self) -> FilterConfig {
        FilterConfig::new(&self.owners, self.unowned, self.tracked)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(cli.verbose, cli.debug);

    let mut out = BufWriter::new(io::stdout().lock());
    let result = run(&cli, &mut out);
    // Lines written before a failure still go out.
    let flushed = out.flush().context("failed to write output");

    match result.and(flushed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, out: impl Write) -> Result<()> {
    let config = cli.filter_config();
    let resolver = Resolver::load(cli.codeowners_file.as_deref())?;

    let tracked = if config.tracked_only() {
        let tracked = GitLsFiles::new(".").tracked_files()?;
        debug!(files = tracked.len(), "listed tracked files");
        if tracked.is_empty() {
            warn!("git reports no tracked files, nothing will be listed");
        }
        Some(tracked)
    } else {
        None
    };

    let mut pipeline = Pipeline::new(&config, &resolver, tracked.as_ref(), Reporter::new(out));
    for root in cli.root_paths() {
        let summary = pipeline.run(&root)?;
        info!(
            root = %root.display(),
            files = summary.files,
            untracked = summary.untracked,
            reported = summary.reported,
            "listed owners"
        );
    }
    Ok(())
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
}
