use anyhow::{anyhow, Context, Result};
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;
use tracing::warn;

use crate::report::ReportImage;

/// Extensions accepted by the upload control.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// An uploaded screenshot, validated by decoding once.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Returns true when the filename ends in one of [`ALLOWED_EXTENSIONS`].
pub fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Decodes every file, splitting accepted images from rejection messages.
/// Upload order is preserved.
pub fn decode_uploads(files: Vec<(String, Vec<u8>)>) -> (Vec<UploadedImage>, Vec<String>) {
    let mut images = Vec::with_capacity(files.len());
    let mut rejected = Vec::new();

    for (filename, bytes) in files {
        match UploadedImage::decode(filename, bytes) {
            Ok(img) => images.push(img),
            Err(e) => {
                warn!("Upload rejected: {:#}", e);
                rejected.push(format!("{:#}", e));
            }
        }
    }

    (images, rejected)
}

impl UploadedImage {
    /// Checks the extension, sniffs the format and decodes the image.
    pub fn decode(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let filename = filename.into();
        if !has_allowed_extension(&filename) {
            return Err(anyhow!("{}: only JPG and PNG files are accepted", filename));
        }

        let format = image::guess_format(&bytes)
            .with_context(|| format!("{}: unrecognized image data", filename))?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(anyhow!("{}: {:?} data is not JPG or PNG", filename, format));
        }

        let decoded = image::load_from_memory_with_format(&bytes, format)
            .with_context(|| format!("{}: unreadable image", filename))?;

        Ok(Self {
            filename,
            format,
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }

    /// PNG thumbnail fitting inside `size` x `size`, aspect ratio preserved.
    pub fn thumbnail_png(&self, size: u32) -> Result<Vec<u8>> {
        let decoded = image::load_from_memory_with_format(&self.bytes, self.format)
            .with_context(|| format!("{}: unreadable image", self.filename))?;
        let thumb = decoded.thumbnail(size, size);

        let mut out = Cursor::new(Vec::new());
        thumb
            .write_to(&mut out, ImageFormat::Png)
            .context("Failed to encode thumbnail")?;
        Ok(out.into_inner())
    }

    pub fn to_report_image(&self) -> ReportImage {
        ReportImage {
            bytes: self.bytes.clone(),
            width: self.width,
            height: self.height,
        }
    }
}
