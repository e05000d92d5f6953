//! thermview: headless camera stream viewer.
//!
//! ```text
//! thermview                          View the stream from the configured device
//! thermview --host 10.0.0.5          Override the device address
//! thermview --timeout-off            Keep viewing past the message ceiling
//! thermview --output latest.png      Where the latest composited frame is written
//! thermview --gen-config             Write default config to stdout
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use thermview::transport::WebSocketConnector;
use thermview::{CameraViewer, ViewerConfig};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "thermview", version, about = "Live thermal camera stream viewer")]
struct Cli {
    /// Path to configuration YAML file.
    #[arg(short, long, default_value = "thermview.yaml")]
    config: PathBuf,

    /// Device host, overriding the config.
    #[arg(long)]
    host: Option<String>,

    /// Device port, overriding the config.
    #[arg(long)]
    port: Option<u16>,

    /// Page query parameters, e.g. `timeout=off`.
    #[arg(long, default_value = "")]
    query: String,

    /// Shorthand for `--query timeout=off`.
    #[arg(long)]
    timeout_off: bool,

    /// PNG file the latest composited frame is written to.
    #[arg(short, long, default_value = "thermview-latest.png")]
    output: PathBuf,

    /// Seconds between PNG writes.
    #[arg(long, default_value_t = 1)]
    write_interval: u64,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", ViewerConfig::default().to_yaml()?);
        return Ok(());
    }

    let mut config = ViewerConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(host) = cli.host {
        config.endpoint.host = host;
    }
    if let Some(port) = cli.port {
        config.endpoint.port = port;
    }
    config.apply_query(&cli.query);
    if cli.timeout_off {
        config.apply_query("timeout=off");
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("thermview v{}", env!("CARGO_PKG_VERSION"));
    info!("device: {}", config.endpoint.endpoint().url());
    info!("message limit: {:?}", config.connection.message_limit);

    let mut viewer = CameraViewer::new(WebSocketConnector::new(), config)?;
    viewer.start().await?;

    let renderer = viewer.renderer();
    let mut writes = tokio::time::interval(Duration::from_secs(cli.write_interval.max(1)));
    let mut written = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, closing");
                break;
            }
            _ = writes.tick() => {
                let (image, rendered) = {
                    let renderer = renderer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    (renderer.composited(), renderer.frames_rendered())
                };
                if rendered > written && image.width() > 0 {
                    if let Err(e) = image.save(&cli.output) {
                        warn!("Failed to write {}: {}", cli.output.display(), e);
                    }
                    written = rendered;
                }

                let viewer_display = viewer.display();
                if let Some(status) = viewer.status() {
                    info!(
                        state = ?status.state,
                        caption = %viewer_display.caption,
                        skipped = status.skipped_frames,
                        received = status.received_messages,
                        "status"
                    );
                }
                if let Some(message) = viewer_display.stopped_message {
                    info!("{}", message);
                    break;
                }
            }
        }
    }

    viewer.shutdown().await?;
    Ok(())
}
