//! d2render CLI - Command-line client for the d2render service

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use d2render_sdk::{RenderClient, RenderRequest, SdkError};
use serde_json::Value;
use std::io::{Read, Write};
use std::path::PathBuf;

const DEFAULT_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "d2render-cli")]
#[command(about = "Render D2 diagrams through a d2render service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Service URL
    #[arg(long, env = "D2RENDER_URL", default_value = DEFAULT_URL)]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a diagram to SVG
    Render {
        /// Diagram source file ("-" for stdin)
        input: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Renderer option as key=value (e.g. -O theme=200 -O layout=elk)
        #[arg(short = 'O', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,

        /// Renderer flag without a value (e.g. --flag sketch)
        #[arg(long = "flag", value_name = "NAME")]
        flags: Vec<String>,
    },

    /// Show service status
    Health,
}

/// Split `key=value` and type the value the way the service expects
fn parse_option(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("Option '{}' must be in KEY=VALUE form", raw))?;

    if key.is_empty() {
        anyhow::bail!("Option '{}' has an empty key", raw);
    }

    let value = match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => match other.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(other.to_string()),
        },
    };

    Ok((key.to_string(), value))
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read diagram from stdin")?;
        Ok(content)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = RenderClient::connect(&cli.url)?;

    match cli.command {
        Commands::Render {
            input,
            output,
            options,
            flags,
        } => {
            let mut request = RenderRequest::new(read_input(&input)?);
            for raw in &options {
                let (key, value) = parse_option(raw)?;
                request = request.option(key, value);
            }
            for flag in flags {
                request = request.flag(flag);
            }

            let svg = match client.render(&request).await {
                Ok(svg) => svg,
                Err(SdkError::Http { status, message }) => {
                    eprintln!(
                        "{} {}",
                        format!("✗ Render failed ({})", status).red().bold(),
                        message
                    );
                    std::process::exit(1);
                }
                Err(e) => return Err(e).context("Failed to reach d2render service"),
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, &svg)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!(
                        "{}",
                        format!("✓ Wrote {} ({} bytes)", path.display(), svg.len())
                            .green()
                            .bold()
                    );
                }
                None => {
                    std::io::stdout()
                        .write_all(&svg)
                        .context("Failed to write SVG to stdout")?;
                }
            }
        }

        Commands::Health => {
            println!("{}", "Service Status".cyan().bold());
            println!();

            match client.health().await {
                Ok(health) => {
                    println!("  {} {}", "URL:".bold(), cli.url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), health.version);
                    println!("  {} {}", "Renderer:".bold(), health.renderer);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
