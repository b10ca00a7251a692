//! Codebox CLI
//!
//! A command-line tool for running code snippets in disposable workspaces.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codebox::{Config, EXAMPLE_CONFIG, ExecutionRequest, ExecutionResult, Executor, Language};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codebox")]
#[command(about = "A tool for running code snippets in disposable workspaces")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: codebox.toml)
        #[arg(short, long, default_value = "codebox.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run a source file (compile if needed, then execute)
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language tag (e.g., python, java, cpp)
        #[arg(short, long)]
        language: String,

        /// Decode transport escapes (\n, \t, \", ...) in the source first
        #[arg(short, long)]
        escaped: bool,

        /// Wall-clock limit for each step, in seconds
        #[arg(short, long)]
        timeout: Option<f64>,
    },

    /// Answer one JSON request `{"language": .., "code": ..}`
    Request {
        /// Request file (default: stdin)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// List available languages
    Languages,

    /// Show the effective configuration
    ShowConfig,
}

/// Transport response: program output, or an error outside the program
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Response {
    Output(String),
    Error(String),
}

impl From<ExecutionResult> for Response {
    fn from(result: ExecutionResult) -> Self {
        if result.status().is_service_error() {
            Response::Error(result.into_text())
        } else {
            Response::Output(result.into_text())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Load configuration
    if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
    } else {
        debug!("using default configuration");
    }
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Run {
            source,
            language,
            escaped,
            timeout,
        } => run_file(config, &source, &language, escaped, timeout).await,
        Commands::Request { input } => answer_request(config, input.as_deref()).await,
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => show_config(&config),
    }
}

async fn run_file(
    config: Config,
    source: &Path,
    language: &str,
    escaped: bool,
    timeout: Option<f64>,
) -> Result<()> {
    let config = match timeout {
        Some(seconds) => config.with_timeout(seconds).context("invalid --timeout")?,
        None => config,
    };

    let code = tokio::fs::read_to_string(source)
        .await
        .context("failed to read source file")?;

    let request = if escaped {
        ExecutionRequest::escaped(language, code)
    } else {
        ExecutionRequest::new(language, code)
    };

    info!(language, "running program");
    let executor = Executor::new(config);
    let result = executor.execute(&request).await;

    // Log execution info via tracing (stderr), keeping stdout clean for piping
    info!(
        status = %result.status(),
        elapsed = format_args!("{:.3}s", result.elapsed().as_secs_f64()),
        exit_code = result.exit_code(),
        "execution result"
    );

    let text = result.text();
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }

    if result.is_success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

async fn answer_request(config: Config, input: Option<&Path>) -> Result<()> {
    let raw = match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .context("failed to read request file")?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read request from stdin")?;
            raw
        }
    };

    let request: ExecutionRequest =
        serde_json::from_str(&raw).context("failed to parse request")?;

    let executor = Executor::new(config);
    let result = executor.execute(&request).await;
    info!(status = %result.status(), "request answered");

    let response = Response::from(result);
    println!(
        "{}",
        serde_json::to_string(&response).context("failed to encode response")?
    );
    Ok(())
}

fn list_languages(config: &Config) {
    println!("Available languages:\n");

    for language in Language::ALL {
        let toolchain = config.toolchain(language);
        let lang_type = if toolchain.is_compiled() {
            "compiled"
        } else {
            "interpreted"
        };
        println!("  {:<15} {} ({})", language.id(), toolchain.name, lang_type);
    }
}

fn show_config(config: &Config) -> Result<()> {
    let rendered = serde_json::to_string_pretty(config).context("failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
