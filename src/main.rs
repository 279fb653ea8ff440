//! voice-invoice - replay a dictation transcript into an invoice
//!
//! Reads one finalized utterance per line (file or stdin), prints the
//! feedback for each one, then the final invoice as JSON.

use anyhow::{bail, Context};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voice_invoice::config::AppConfig;
use voice_invoice::pipeline::{DictationPipeline, PipelineConfig};
use voice_invoice::stt::{ScriptedSource, TranscriptSource};

const USAGE: &str = "usage: voice-invoice [--config PATH] [TRANSCRIPT | -]";

struct Args {
    config: PathBuf,
    transcript: Option<PathBuf>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut config = AppConfig::default_path();
        let mut transcript = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => {
                    config = args.next().map(PathBuf::from).context(USAGE)?;
                }
                "-h" | "--help" => bail!(USAGE),
                "-" => transcript = None,
                _ if arg.starts_with('-') => bail!("unknown option {}\n{}", arg, USAGE),
                _ => transcript = Some(PathBuf::from(arg)),
            }
        }

        Ok(Self { config, transcript })
    }
}

async fn read_transcript(path: Option<&PathBuf>) -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::new();
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open transcript {}", path.display()))?;
            let mut reader = BufReader::new(file).lines();
            while let Some(line) = reader.next_line().await? {
                lines.push(line);
            }
        }
        None => {
            let mut reader = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = reader.next_line().await? {
                lines.push(line);
            }
        }
    }
    Ok(lines)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout carries the JSON output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voice_invoice=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("voice-invoice v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse(std::env::args().skip(1))?;
    let config = AppConfig::load(&args.config);
    let lines = read_transcript(args.transcript.as_ref()).await?;

    let mut source = ScriptedSource::from_lines(&lines);
    source.set_language(config.language());

    let mut pipeline = DictationPipeline::new(PipelineConfig::from(&config));
    let mut feedback = pipeline.subscribe();

    let printer = tokio::spawn(async move {
        loop {
            match feedback.recv().await {
                Ok(item) => match serde_json::to_string(&item) {
                    Ok(json) => println!("{}", json),
                    Err(e) => tracing::error!("Feedback serialization error: {}", e),
                },
                Err(RecvError::Lagged(missed)) => tracing::warn!("{} feedback messages dropped", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    pipeline.start().await?;
    let forwarded = pipeline.forward_from(&mut source).await?;
    pipeline.stop().await?;
    tracing::info!("Replayed {} transcript events", forwarded);

    let invoice = pipeline.snapshot();
    // Closes the feedback channel so the printer finishes
    drop(pipeline);
    printer.await.context("feedback printer failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&invoice).context("cannot serialize invoice")?
    );
    Ok(())
}
