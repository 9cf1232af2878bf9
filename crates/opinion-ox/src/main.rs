//! Classify social-media posts for brand public-opinion risk.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use dashscope_ox::DashScope;
use opinion_ox::{Analyzer, DEFAULT_REFERENCE_FILE, Payload};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "opinion-ox")]
#[command(about = "Classify social-media posts for brand public-opinion risk")]
#[command(version)]
struct Args {
    /// JSON file holding one payload object or an array of them
    #[arg(short, long)]
    payload: Option<PathBuf>,

    /// Post text to classify
    #[arg(short, long)]
    content: Option<String>,

    /// Image URL or local path attached to --content (repeatable)
    #[arg(short, long = "image")]
    images: Vec<String>,

    /// Reference-case file
    #[arg(short, long, default_value = DEFAULT_REFERENCE_FILE)]
    references: PathBuf,

    /// Request the verdict as a streamed response
    #[arg(long)]
    stream: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn read_payloads(path: &Path) -> anyhow::Result<Vec<Payload>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payload file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("payload file {} is not valid JSON", path.display()))?;

    let payloads = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|payload| vec![payload])
    };
    payloads.with_context(|| format!("payload file {} has an unexpected shape", path.display()))
}

fn collect_payloads(args: &Args) -> anyhow::Result<Vec<Payload>> {
    let mut payloads = match &args.payload {
        Some(path) => read_payloads(path)?,
        None => Vec::new(),
    };

    if args.content.is_some() || !args.images.is_empty() {
        payloads.push(Payload {
            content: args.content.clone().unwrap_or_default(),
            images: args.images.clone(),
        });
    }

    if payloads.is_empty() {
        bail!("nothing to analyze: pass --payload, --content or --image");
    }
    Ok(payloads)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!("{default_level},hyper=warn,reqwest=warn"))
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let payloads = collect_payloads(&args)?;
    info!(payloads = payloads.len(), references = %args.references.display(), "starting analysis");

    let analyzer = Analyzer::new(DashScope::load_from_env(), &args.references)
        .with_stream(args.stream);

    for (i, payload) in payloads.iter().enumerate() {
        let output = analyzer.analyze(payload).await;
        println!("#{} {}", i + 1, serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
