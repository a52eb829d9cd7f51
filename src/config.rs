//! Application configuration.
//!
//! Loads settings from config.json at startup. Every field has a default, so a
//! missing or partial file still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Explicit path to the tesseract executable (skips discovery)
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory (skips discovery)
    pub tessdata_dir: Option<PathBuf>,
    /// Fetch missing traineddata into the local tesseract dir at startup
    pub download_tessdata: bool,
    /// Tesseract language code
    pub ocr_language: String,
    /// Tesseract page segmentation mode
    pub ocr_psm: u8,
    /// Brightness threshold preprocessing (pixels with R, G, B all > threshold
    /// become text). None means plain grayscale.
    pub ocr_threshold: Option<u8>,
    /// Prefilled patient name
    pub default_patient_name: String,
    /// Prefilled conclusion text
    pub default_conclusion: String,
    /// Study date line printed under the patient name
    pub study_date: String,
    /// Display width of each annex image in inches
    pub image_width_inches: f32,
    /// Bounding box (pixels) of preview thumbnails
    pub thumbnail_size: u32,
    /// Idle time after which a session is dropped
    pub session_ttl_secs: u64,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8501".to_string(),
            tesseract_path: None,
            tessdata_dir: None,
            download_tessdata: false,
            ocr_language: "eng".to_string(),
            ocr_psm: 6,
            ocr_threshold: None,
            default_patient_name: "NILDA RODRIGUEZ".to_string(),
            default_conclusion: "Preserved global and segmental left ventricular systolic function.\n\
                                 No significant valvular disease."
                .to_string(),
            study_date: "Study date: 15/01/2025".to_string(),
            image_width_inches: 3.0,
            thumbnail_size: 240,
            session_ttl_secs: 3600,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Loads configuration from the first config.json found in `candidates`,
/// falling back to defaults.
pub fn load_config(candidates: &[PathBuf]) -> AppConfig {
    for config_path in candidates {
        if !config_path.exists() {
            continue;
        }

        info!("Loading config from {}", config_path.display());
        match read_config(config_path) {
            Ok(config) => return config,
            Err(e) => {
                warn!("{}. Using defaults.", e);
                return AppConfig::default();
            }
        }
    }

    info!("config.json not found. Using default config.");
    AppConfig::default()
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&[dir.path().join("config.json")]);
        assert_eq!(config.bind_addr, "127.0.0.1:8501");
        assert_eq!(config.default_patient_name, "NILDA RODRIGUEZ");
        assert_eq!(config.ocr_psm, 6);
        assert!(config.ocr_threshold.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "ocr_language": "spa", "ocr_threshold": 180 }"#).unwrap();

        let config = load_config(&[path]);
        assert_eq!(config.ocr_language, "spa");
        assert_eq!(config.ocr_threshold, Some(180));
        assert_eq!(config.image_width_inches, 3.0);
        assert_eq!(config.session_ttl_secs, 3600);
    }

    #[test]
    fn test_invalid_json_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = load_config(&[path]);
        assert_eq!(config.study_date, "Study date: 15/01/2025");
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let present = dir.path().join("present.json");
        fs::write(&present, r#"{ "bind_addr": "0.0.0.0:9000" }"#).unwrap();

        let config = load_config(&[missing, present]);
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }
}
