use anyhow::Context;
use clap::{Parser, Subcommand};
use fs_err as fs;
use std::path::PathBuf;
use std::process::Command as ProcessCommand;
use tracefix_cli::config::{CliOverrides, ConfigMerger, TracefixConfig};

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a tracefix.toml holding the effective defaults.
    PrintDefaults,
    /// Create tests/fixtures/<name>/input.go from a template.
    NewFixture { name: String },
    /// Bless golden fixtures (overwrite expected outputs).
    BlessFixtures,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::PrintDefaults => {
            let merged = ConfigMerger::new(TracefixConfig::default()).merge(&CliOverrides::default());
            let config = TracefixConfig {
                exclude: merged.settings.exclude,
                tagged: merged.settings.tagged,
                exported: merged.settings.exported,
                methods: merged.settings.methods,
                pattern: merged.pattern,
                hints: merged.hints,
            };
            let text = toml::to_string_pretty(&config).context("serialize defaults")?;
            print!("{text}");
        }
        Command::NewFixture { name } => {
            let dir = PathBuf::from("tests").join("fixtures").join(&name);
            if dir.exists() {
                anyhow::bail!("fixture {} already exists", dir.display());
            }
            fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
            fs::write(
                dir.join("input.go"),
                "package main\n\nimport \"context\"\n\nfunc Foo(ctx context.Context) {}\n",
            )?;
            println!(
                "created {}/input.go; edit it, then run `cargo xtask bless-fixtures`",
                dir.display()
            );
        }
        Command::BlessFixtures => {
            let status = ProcessCommand::new("cargo")
                .args(["test", "-p", "tracefix-core", "--test", "golden_fixtures"])
                .env("TRACEFIX_BLESS", "1")
                .status()
                .context("run golden fixture blessing")?;
            if !status.success() {
                anyhow::bail!("bless-fixtures failed");
            }
        }
    }
    Ok(())
}
