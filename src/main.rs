//! Echocardiography Report Tool
//!
//! A small web form that collects echocardiogram screenshots, suggests the
//! ejection fraction from the first image with Tesseract OCR, and produces a
//! Word report with an image annex.

mod config;
mod logging;
mod ocr;
mod paths;
mod report;
mod session;
mod web;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use ocr::{TesseractEngine, TextRecognizer, UnavailableEngine};

/// Locates Tesseract, fetching traineddata first when configured to.
fn build_recognizer(config: &config::AppConfig) -> Arc<dyn TextRecognizer> {
    if let Err(e) = ocr::ensure_tessdata(config) {
        warn!("Failed to fetch tessdata: {:#}", e);
    }

    match ocr::resolve_tesseract(config) {
        Ok(paths) => Arc::new(TesseractEngine::new(
            paths,
            config.ocr_language.clone(),
            config.ocr_psm,
        )),
        Err(e) => {
            warn!("{:#}", e);
            warn!("Ejection fraction suggestions will not work.");
            Arc::new(UnavailableEngine::new(e.to_string()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    paths::ensure_directories()?;
    logging::init_logging(&paths::get_logs_dir());
    logging::install_panic_hook();

    let config = config::load_config(&paths::config_candidates());

    let recognizer = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || build_recognizer(&config)).await?
    };

    info!("Starting echo report form");
    web::start_server(web::AppState::new(config, recognizer)).await
}
