mod app;
mod config;
mod upload;
mod utils;

use anyhow::{anyhow, Context};
use app::StudyUploader;
use config::UploaderConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use upload::HttpChannel;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = UploaderConfig::load().context("loading configuration")?;
    let channel = Arc::new(HttpChannel::new(&config).context("building HTTP client")?);
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([600.0, 600.0])
            .with_min_inner_size([400.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Study Material Uploader",
        options,
        Box::new(move |cc| Box::new(StudyUploader::new(cc, &config, channel, handle))),
    )
    .map_err(|e| anyhow!("window closed with an error: {}", e))
}
