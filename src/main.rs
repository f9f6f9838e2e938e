use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clash_aggregator::aggregator::{Aggregator, PipelineConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A Clash subscription aggregator with geo-based renaming
#[derive(Parser)]
#[command(name = "clash-aggregator")]
#[command(about = "Aggregates Clash proxy subscriptions into one geo-labeled feed")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// File containing subscription URLs, one per line
    #[arg(short, long, default_value = "sources.txt")]
    sources: PathBuf,

    /// Output subscription file
    #[arg(short, long, default_value = "output/subscription.yaml")]
    output: PathBuf,

    /// Timeout in seconds for each network request
    #[arg(long, default_value = "15")]
    timeout: u64,

    /// Number of concurrent fetches
    #[arg(short = 'n', long, default_value = "8")]
    concurrency: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, geo-label and merge all subscriptions (the default)
    Aggregate,
    /// Merge subscriptions as-is, without renaming entries
    Merge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let enrich = !matches!(cli.command, Some(Commands::Merge));

    let sources = read_sources(&cli.sources)?;
    if sources.is_empty() {
        bail!("no source URLs found in {:?}", cli.sources);
    }
    println!("Found {} subscription URLs", sources.len());

    let config = PipelineConfig::new()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_concurrency(cli.concurrency)
        .with_enrichment(enrich);
    let aggregator = Aggregator::with_config(config)?;

    let subscription = aggregator.run(&sources).await?;

    if let Some(dir) = cli.output.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {:?}", dir))?;
        }
    }
    fs::write(&cli.output, subscription.to_yaml()?)
        .with_context(|| format!("failed to write {:?}", cli.output))?;

    println!("Wrote {} proxies to {:?}", subscription.len(), cli.output);
    Ok(())
}

/// Read the source list: one URL per line, blank lines and `#` comments
/// ignored
fn read_sources(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
