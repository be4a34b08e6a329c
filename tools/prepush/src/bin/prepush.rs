use clap::Parser;
use prepush::config::FileConfig;
use prepush::{detect, reporter, Options, Registry};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Run validation checks for every language detected in a repository.
#[derive(Debug, Parser)]
#[command(name = "prepush", version)]
struct Cli {
    /// Repository directory to check
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Skip tests
    #[arg(long)]
    no_test: bool,

    /// Skip linting
    #[arg(long)]
    no_lint: bool,

    /// Skip format checks
    #[arg(long)]
    no_format: bool,

    /// Report coverage (informational, never blocks)
    #[arg(long)]
    coverage: bool,

    /// Package pattern excluded from Go coverage
    #[arg(long, value_name = "PATTERN")]
    go_exclude_coverage: Option<String>,

    /// Print a Go/No-Go poll instead of the standard summary
    #[arg(long)]
    go_no_go: bool,

    /// Show tool output for every check
    #[arg(short, long)]
    verbose: bool,

    /// Check detected projects concurrently
    #[arg(long)]
    parallel: bool,

    /// Kill any single tool run after this many seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Debug logging on stderr
    #[arg(long)]
    debug: bool,
}

impl Cli {
    /// Flags win over whatever `base` already holds.
    fn apply(&self, mut opts: Options) -> Options {
        if self.no_test {
            opts.test = false;
        }
        if self.no_lint {
            opts.lint = false;
        }
        if self.no_format {
            opts.format = false;
        }
        if self.coverage {
            opts.coverage = true;
        }
        if let Some(exclude) = &self.go_exclude_coverage {
            opts.go_exclude_coverage = exclude.clone();
        }
        if self.verbose {
            opts.verbose = true;
        }
        if self.parallel {
            opts.parallel = true;
        }
        if let Some(secs) = self.timeout {
            opts.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        opts
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("prepush=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prepush=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if !cli.dir.is_dir() {
        eprintln!("Error: directory {} does not exist", cli.dir.display());
        return ExitCode::FAILURE;
    }

    let file_config = FileConfig::load(&cli.dir).unwrap_or_else(|error| {
        tracing::warn!("ignoring config: {error}");
        FileConfig::default()
    });
    let opts = cli.apply(file_config.apply(Options::default()));
    tracing::debug!(?opts, "resolved options");

    println!("=== Pre-push Checks ===");
    println!();
    println!("Detecting languages...");

    let detections = match detect::detect(&cli.dir) {
        Ok(detections) => detections,
        Err(error) => {
            eprintln!("Error detecting languages: {error}");
            return ExitCode::FAILURE;
        }
    };

    if detections.is_empty() {
        println!("No supported languages detected.");
        return ExitCode::SUCCESS;
    }

    for detection in &detections {
        println!("  Found: {} in {}", detection.language, detection.path.display());
    }
    println!();

    let results = Registry::with_defaults().run(&detections, &opts);

    let all_passed = if cli.go_no_go {
        reporter::print_go_no_go_report(&results, opts.verbose)
    } else {
        reporter::print_report(&results, opts.verbose).all_passed()
    };

    if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
