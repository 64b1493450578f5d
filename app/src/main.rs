mod app;
mod ui;

use std::error::Error;

use app::SketchApp;
use sketchml::{BackendConfig, Session};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILTER: &str = "sketchml=info,sketchml_app=info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let backend = BackendConfig::from_env()?;
    let session = Session::start(&backend)?;
    info!(
        "session {} against {}",
        session.id().as_str(),
        backend.http_base()
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([960.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "SketchML",
        native_options,
        Box::new(move |cc| Ok(Box::new(SketchApp::new(&session, &cc.egui_ctx)))),
    )?;
    Ok(())
}
