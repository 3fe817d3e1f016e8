//! # secret-template CLI
//!
//! Renders CloudFormation templates from declaration manifests.
//!
//! ## Usage
//!
//! ```bash
//! # Render a manifest as JSON on stdout
//! secret-template synth -f stack.yaml
//!
//! # Render as YAML into a file
//! secret-template synth -f stack.yaml --format yaml -o template.yaml
//!
//! # Print the manifest JSON schema
//! secret-template schema
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secret_template::config::manifest::Manifest;
use secret_template::observability::init_cli_logging;
use std::path::PathBuf;
use tracing::debug;

/// Secret Template CLI
#[derive(Debug, Parser)]
#[command(name = "secret-template", version, about = "Secret Template CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log declarations to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a CloudFormation template from a manifest
    Synth {
        /// Manifest file (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write the template here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the manifest JSON schema
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_logging(cli.verbose)?;

    match cli.command {
        Commands::Synth {
            file,
            format,
            output,
        } => synth(&file, format, output.as_deref()),
        Commands::Schema => {
            let schema = serde_json::to_string_pretty(&Manifest::json_schema())
                .context("Failed to render manifest schema")?;
            println!("{schema}");
            Ok(())
        }
    }
}

fn synth(
    file: &std::path::Path,
    format: OutputFormat,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read manifest {}", file.display()))?;
    let manifest = Manifest::from_yaml(&source)
        .with_context(|| format!("Invalid manifest {}", file.display()))?;
    let stack = manifest
        .synthesize()
        .with_context(|| format!("Failed to synthesize stack {}", manifest.stack))?;

    let template = stack.to_template();
    let rendered = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&template).context("Failed to render template")? + "\n"
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(&template).context("Failed to render template")?
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write template {}", path.display()))?;
            debug!(path = %path.display(), "Wrote template");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
