pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{TesseractEngine, TextRecognizer, UnavailableEngine};
pub use extract::suggest_ejection_fraction;
pub use setup::{ensure_tessdata, resolve_tesseract};

use anyhow::{Context, Result};
use tracing::info;

use preprocess::prepare_for_ocr;

/// High-level function: encoded image → suggested ejection fraction.
///
/// Decodes the image, preprocesses it, runs the recognizer and scans the text.
/// Recognition failures propagate; a missing value yields [`extract::NO_SUGGESTION`].
pub fn suggest_from_image(
    bytes: &[u8],
    recognizer: &dyn TextRecognizer,
    threshold: Option<u8>,
) -> Result<String> {
    let img = image::load_from_memory(bytes).context("Unreadable image")?;
    let prepared = prepare_for_ocr(&img, threshold);
    let text = recognizer.recognize(&prepared)?;
    let value = suggest_ejection_fraction(&text)?;

    info!("OCR suggestion: {} ({} chars recognized)", value, text.len());
    Ok(value)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::anyhow;
    use image::GrayImage;

    /// Recognizer that returns canned text, or fails when given none.
    pub struct FixedText(pub Option<&'static str>);

    impl TextRecognizer for FixedText {
        fn recognize(&self, _img: &GrayImage) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| anyhow!("OCR engine unavailable"))
        }
    }

    /// Encodes a small solid PNG.
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([20, 20, 20]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }
}
