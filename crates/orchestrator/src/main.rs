//! `retouch`: run cleanup and inpainting jobs against a retouch gateway.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use retouch_core::payload::{CleanupPayload, ImageBlob, InpaintPayload, DEFAULT_IMAGE_CONTENT_TYPE};
use retouch_orchestrator::{HttpGateway, Orchestrator, OrchestratorConfig, SessionHooks};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound for a single HTTP call to the gateway.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Remove or repaint masked regions of an image through a retouch gateway")]
#[command(version)]
struct Cli {
    /// Gateway server origin
    #[arg(
        long,
        global = true,
        env = "RETOUCH_GATEWAY_URL",
        default_value = "http://localhost:3000"
    )]
    gateway: String,

    /// Wait between status polls, in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Polls without output before giving up
    #[arg(long, global = true, default_value_t = 20)]
    max_attempts: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove the masked object and write the result
    Clean {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        mask: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },

    /// Repaint the masked region from a prompt and print output URLs
    Inpaint {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        mask: PathBuf,
        #[arg(long)]
        prompt: String,
        #[arg(long, default_value_t = 1)]
        outputs: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retouch=info,retouch_orchestrator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = OrchestratorConfig {
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
        max_attempts: cli.max_attempts,
    };
    let gateway = HttpGateway::new(&cli.gateway, REQUEST_TIMEOUT)
        .context("Failed to build HTTP client")?;
    let hooks = SessionHooks::default().on_poll(|report| {
        tracing::info!(attempt = report.attempt, status = %report.status, "Waiting for output");
    });
    let orchestrator = Orchestrator::new(Arc::new(gateway), config)?.with_hooks(hooks);

    // Ctrl-C cancels the running session instead of killing the process.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, cancelling");
            on_signal.cancel();
        }
    });

    match cli.command {
        Commands::Clean { image, mask, out } => {
            let payload = CleanupPayload::new(read_image(&image).await?, read_image(&mask).await?)?;
            let artifact = orchestrator.cleanup(&payload, &cancel).await?;
            tokio::fs::write(&out, &artifact.bytes)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), bytes = artifact.bytes.len(), "Wrote cleaned image");
        }
        Commands::Inpaint {
            image,
            mask,
            prompt,
            outputs,
        } => {
            let payload = InpaintPayload::new(
                read_image(&image).await?,
                read_image(&mask).await?,
                prompt,
                outputs,
            )?;
            for reference in orchestrator.inpaint(&payload, &cancel).await? {
                println!("{reference}");
            }
        }
    }

    Ok(())
}

async fn read_image(path: &Path) -> Result<ImageBlob> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ImageBlob::new(bytes, content_type_for(path)))
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => DEFAULT_IMAGE_CONTENT_TYPE,
    }
}
