use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracefix_cli::config::{self, CliOverrides, ConfigMerger};
use tracefix_core::adapters::{FsPackageSource, FsWritePort, InMemoryWritePort};
use tracefix_core::ports::WritePort;
use tracefix_core::{RunOutcome, RunSettings, TraceError};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tracefix",
    version,
    about = "Adds and removes opentracing spans at the top of Go functions."
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rewrite matching packages in place.
    Apply(RunArgs),
    /// Print the changes as a unified diff without writing.
    Diff(RunArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Package patterns: directories, `./...`, `dir/...` or globs.
    #[arg(required = true)]
    patterns: Vec<String>,

    /// Directory patterns are resolved against (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Config file (default: <root>/tracefix.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Do not run on packages whose `<dir>/<name>` matches this regex. Repeatable.
    #[arg(long)]
    exclude: Vec<String>,

    /// Only run on tagged types, functions, and methods.
    #[arg(long, default_value_t = false)]
    tagged: bool,

    /// Only run on exported types, functions, and methods.
    #[arg(long, default_value_t = false)]
    exported: bool,

    /// Only run on methods.
    #[arg(long, default_value_t = false)]
    methods: bool,

    /// Package name for an import path, as `path=name`. Repeatable.
    #[arg(long = "hint")]
    hints: Vec<String>,

    /// Print the run summary as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!("{:?}", e);
            let code = e.downcast_ref::<TraceError>().map_or(1, TraceError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Diff(args) => cmd_diff(args),
    }
}

fn cmd_apply(args: RunArgs) -> anyhow::Result<()> {
    let json = args.json;
    let outcome = execute(args, &FsWritePort)?;
    if json {
        return print_json(&outcome);
    }
    let changed = outcome.summary.changed.len();
    info!("updated {} file(s)", changed);
    println!(
        "{} package(s), {} file(s) updated",
        outcome.summary.packages, changed
    );
    Ok(())
}

fn cmd_diff(args: RunArgs) -> anyhow::Result<()> {
    let json = args.json;
    let outcome = execute(args, &InMemoryWritePort::new())?;
    if json {
        return print_json(&outcome);
    }
    print!("{}", outcome.patch);
    Ok(())
}

fn execute(args: RunArgs, writer: &dyn WritePort) -> anyhow::Result<RunOutcome> {
    let file_config = config::load_or_default(args.config.as_deref(), &args.root)
        .context("load tracefix.toml config")?;
    let overrides = CliOverrides {
        exclude: args.exclude,
        tagged: args.tagged,
        exported: args.exported,
        methods: args.methods,
        hints: config::parse_hints(&args.hints)?,
    };
    let merged = ConfigMerger::new(file_config).merge(&overrides);
    debug!(
        "merged config: exclude={:?}, tagged={}, exported={}, methods={}",
        merged.settings.exclude,
        merged.settings.tagged,
        merged.settings.exported,
        merged.settings.methods
    );

    let settings = RunSettings {
        root: args.root.clone(),
        settings: merged.settings,
        pattern: merged.pattern,
        hints: merged.hints,
    };
    let source = FsPackageSource::new(args.root, args.patterns);
    let outcome = tracefix_core::run(&settings, &source, writer)?;
    Ok(outcome)
}

fn print_json(outcome: &RunOutcome) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(&outcome.summary).context("serialize json")?;
    println!("{s}");
    Ok(())
}
