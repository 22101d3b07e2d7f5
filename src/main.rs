use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::error;
use tokio::sync::mpsc;

mod actions;
mod config;
mod engine;
mod env;
mod error;
mod networking;
mod seed;
mod storage;
mod ui;

use crate::config::PanelConfig;
use crate::engine::SyncEngine;
use crate::engine::state::{SyncEvent, SyncReport};
use crate::networking::CatalogClient;
use crate::storage::ManifestStore;

const WINDOW_TITLE: &str = "Developer Other Apps";

#[derive(Parser, Debug)]
#[command(
    name = "Other Apps",
    author,
    version,
    about = "Browse and download the developer's other apps"
)]
struct Cli {
    /// Print the panel version and exit without starting the UI.
    #[arg(long)]
    version_only: bool,
    /// Run one catalog update in the terminal and exit.
    #[arg(long)]
    sync_only: bool,
    /// Directory holding the cached manifest and app details.
    #[arg(long, value_name = "PATH")]
    cache_dir: Option<PathBuf>,
    #[arg(long, value_name = "URL")]
    manifest_url: Option<String>,
    /// Config file to use instead of the per-user one.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn panel_config(&self) -> PanelConfig {
        let mut config = match &self.config {
            Some(path) => PanelConfig::load_from_path(path),
            None => PanelConfig::load(),
        };
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        if let Some(url) = &self.manifest_url {
            config.manifest_url = url.clone();
        }
        config
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.version_only {
        println!("Other Apps {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = cli.panel_config();
    if let Err(err) = env::ensure_dirs(&config.cache_dir()) {
        error!(
            "failed to create cache directory {}: {err}",
            config.cache_dir().display()
        );
    }

    if cli.sync_only {
        let code = match run_headless(&config) {
            Ok(report) if report.is_complete() => 0,
            Ok(_) => 2,
            Err(err) => {
                eprintln!("update failed: {err}");
                1
            }
        };
        std::process::exit(code);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_icon(default_icon())
            .with_inner_size(eframe::egui::vec2(800.0, 600.0)),
        ..Default::default()
    };
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(ui::PanelApp::new(cc, config)))),
    )
}

fn run_headless(config: &PanelConfig) -> Result<SyncReport, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("failed to create Tokio runtime: {err}"))?;
    let store = ManifestStore::new(config.cache_dir());
    let source = Arc::new(CatalogClient::new(config));
    let engine = SyncEngine::new(store, source, config, Arc::new(AtomicBool::new(false)));

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress.set_message("checking for updates");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = runtime.block_on(async {
        let sync = async {
            let result = engine.sync(&tx).await;
            drop(tx);
            result
        };
        let render = async {
            while let Some(event) = rx.recv().await {
                render_event(&progress, event);
            }
        };
        let (result, ()) = tokio::join!(sync, render);
        result
    });

    match outcome {
        Ok(report) => {
            progress.finish_with_message(report.summary());
            for (identifier, err) in &report.failed {
                println!("  {identifier}: {err}");
            }
            if !report.stale.is_empty() {
                println!("  no longer listed: {}", report.stale.join(", "));
            }
            Ok(report)
        }
        Err(err) => {
            progress.abandon();
            Err(err.to_string())
        }
    }
}

fn render_event(progress: &ProgressBar, event: SyncEvent) {
    match event {
        SyncEvent::Planned { total } => {
            progress.set_length(total as u64);
            progress.set_message("fetching app details");
        }
        SyncEvent::RecordUpdated(entry) => {
            progress.inc(1);
            progress.set_message(format!("{} {}", entry.record.name, entry.record.version));
        }
        SyncEvent::RecordFailed { identifier, .. } => {
            progress.inc(1);
            progress.set_message(format!("{identifier} failed"));
        }
        SyncEvent::Started | SyncEvent::Loaded(_) | SyncEvent::Finished(_) | SyncEvent::Failed(_) => {}
    }
}

fn default_icon() -> eframe::egui::IconData {
    // 2x2: dark background with a teal accent.
    let rgba: Vec<u8> = vec![
        20, 24, 32, 255, 30, 196, 220, 255, //
        20, 24, 32, 255, 20, 150, 180, 255,
    ];
    eframe::egui::IconData {
        rgba,
        width: 2,
        height: 2,
    }
}
