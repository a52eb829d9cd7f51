use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;

use super::setup::TesseractPaths;

/// Anything that turns a preprocessed image into recognized text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, img: &GrayImage) -> Result<String>;
}

/// Runs the Tesseract CLI as a child process.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    paths: TesseractPaths,
    language: String,
    psm: u8,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, language: impl Into<String>, psm: u8) -> Self {
        Self {
            paths,
            language: language.into(),
            psm,
        }
    }

    fn command(&self, input: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.paths.executable);
        cmd.arg(input).arg("stdout");
        if let Some(tessdata) = &self.paths.tessdata {
            cmd.arg("--tessdata-dir").arg(tessdata);
        }
        cmd.arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string());
        cmd
    }
}

impl TextRecognizer for TesseractEngine {
    /// Writes the image to a temp PNG and returns Tesseract's stdout text.
    fn recognize(&self, img: &GrayImage) -> Result<String> {
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let output = self
            .command(temp_input.path())
            .output()
            .with_context(|| {
                format!("Failed to run {}", self.paths.executable.display())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!("Tesseract returned {} chars", text.len());
        Ok(text)
    }
}

/// Stands in when Tesseract could not be located at startup, so every
/// suggestion reports why.
#[derive(Debug, Clone)]
pub struct UnavailableEngine {
    reason: String,
}

impl UnavailableEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TextRecognizer for UnavailableEngine {
    fn recognize(&self, _img: &GrayImage) -> Result<String> {
        Err(anyhow!("OCR unavailable: {}", self.reason))
    }
}
