//! memoizer CLI - rewrites [[memoize]]-tagged C++ functions into cache-backed wrappers

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output
// - Files are only written with --write

use anyhow::Context;
use clap::{Parser, Subcommand};
use memoizer_core::config;
use memoizer_core::{render_json, render_source, render_text, rewrite_path, write_patched};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Files whose presence marks a directory as the project root
const PROJECT_MARKERS: &[&str] = &[".memoizerrc.json", "memoizer.config.json", ".git"];

#[derive(Parser)]
#[command(name = "memoizer")]
#[command(about = "Rewrites [[memoize]]-tagged C++ functions so every call goes through a cache")]
#[command(version = env!("MEMOIZER_VERSION"))]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite tagged functions (dry run unless --write is given)
    Rewrite {
        /// Path to source file or directory
        path: PathBuf,

        /// Rewrite files in place
        #[arg(long)]
        write: bool,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Callable the generated wrappers pass the original function to (overrides config file)
        #[arg(long)]
        adapter: Option<String>,

        /// Attribute name that tags functions (overrides config file)
        #[arg(long)]
        marker: Option<String>,
    },
    /// Validate a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without rewriting anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// One line per tagged function
    Text,
    /// Reports with the applied edit lists
    Json,
    /// The rewritten sources
    Source,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Rewrite {
            path,
            write,
            format,
            config: config_path,
            adapter,
            marker,
        } => {
            if !path.exists() {
                anyhow::bail!("Path does not exist: {}", path.display());
            }

            // Load configuration
            let project_root = find_project_root(&path)?;
            let mut resolved_config = config::load_and_resolve(&project_root, config_path.as_deref())
                .context("failed to load configuration")?;

            if let Some(config_path) = &resolved_config.config_path {
                info!("Using config: {}", config_path.display());
            }

            // CLI flags override config file values
            if let Some(marker) = marker {
                resolved_config.set_marker(&marker)?;
            }
            if let Some(adapter) = adapter {
                resolved_config.set_adapter(&adapter)?;
            }

            let reports = rewrite_path(&path, &resolved_config)?;

            match format {
                OutputFormat::Text => print!("{}", render_text(&reports)),
                OutputFormat::Json => println!("{}", render_json(&reports)),
                OutputFormat::Source => print!("{}", render_source(&reports)),
            }

            if write {
                let mut written = 0usize;
                for report in &reports {
                    if write_patched(report)? {
                        written += 1;
                    }
                }
                info!("Wrote {} file(s)", written);
            }

            if reports.iter().any(|report| report.has_failures()) {
                std::io::stdout().flush()?;
                std::process::exit(1);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;

                println!("Configuration:");
                if let Some(ref p) = resolved.config_path {
                    println!("  Source: {}", p.display());
                } else {
                    println!("  Source: defaults (no config file found)");
                }
                println!();
                println!("Rewrite:");
                println!("  marker: [[{}]]", resolved.marker);
                println!("  adapter: {}", resolved.adapter);
                println!();
                println!("Filters:");
                println!(
                    "  include: {}",
                    if resolved.include.is_some() {
                        "custom patterns"
                    } else {
                        "all C++ sources and headers"
                    }
                );
                println!(
                    "  exclude: active ({} patterns)",
                    if resolved.custom_excludes {
                        "custom"
                    } else {
                        "default"
                    }
                );
            }
        },
    }

    Ok(())
}

/// Install the stderr log subscriber
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Nearest directory at or above `path` that holds a config file or a `.git`
/// directory; the starting directory itself when there is none
fn find_project_root(path: &Path) -> anyhow::Result<PathBuf> {
    let absolute = if path.is_relative() {
        std::env::current_dir()?.join(path)
    } else {
        path.to_path_buf()
    };
    let start = if absolute.is_file() {
        absolute.parent().unwrap_or(&absolute).to_path_buf()
    } else {
        absolute
    };

    let root = start
        .ancestors()
        .find(|dir| PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists()))
        .unwrap_or(&start)
        .to_path_buf();
    Ok(root)
}
