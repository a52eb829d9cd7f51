//! Per-browser session state.
//!
//! Tracks uploaded images, the OCR suggestion and the form values between
//! requests.

use chrono::{DateTime, Local};
use serde::Deserialize;

use super::upload::UploadedImage;
use crate::config::AppConfig;
use crate::report::ReportDraft;

/// Text fields as last submitted by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormFields {
    pub patient_name: String,
    /// Some only when the user typed a value different from the default
    pub ejection_fraction: Option<String>,
    pub conclusion: String,
}

/// Form body posted by the suggest and generate buttons.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FormSubmission {
    pub patient_name: String,
    pub ejection_fraction: String,
    /// Ejection fraction default the form was rendered with
    pub ef_default: String,
    pub conclusion: String,
}

/// State of one browser session.
#[derive(Debug)]
pub struct SessionState {
    /// Upload order
    pub images: Vec<UploadedImage>,
    /// Last OCR suggestion, used as the ejection fraction default
    pub suggested_ef: Option<String>,
    pub fields: FormFields,
    /// Field-level error for the upload control
    pub upload_error: Option<String>,
    /// Field-level error for the ejection fraction field
    pub ocr_error: Option<String>,
    pub last_seen: DateTime<Local>,
}

impl SessionState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            images: Vec::new(),
            suggested_ef: None,
            fields: FormFields {
                patient_name: config.default_patient_name.clone(),
                ejection_fraction: None,
                conclusion: config.default_conclusion.clone(),
            },
            upload_error: None,
            ocr_error: None,
            last_seen: Local::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Local::now();
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    /// Replaces the image list with the decodable files, in upload order.
    ///
    /// Returns the number of accepted files.
    #[cfg(test)]
    pub fn replace_images(&mut self, files: Vec<(String, Vec<u8>)>) -> usize {
        let (images, rejected) = super::upload::decode_uploads(files);
        self.set_images(images, rejected)
    }

    /// Installs already decoded images. Rejected files are listed in
    /// `upload_error`. An OCR error belongs to the previous first image and
    /// is dropped.
    pub fn set_images(&mut self, images: Vec<UploadedImage>, rejected: Vec<String>) -> usize {
        self.ocr_error = None;
        self.upload_error = if rejected.is_empty() {
            None
        } else {
            Some(format!("Skipped: {}", rejected.join("; ")))
        };
        self.images = images;
        self.images.len()
    }

    /// Default shown in the ejection fraction field.
    pub fn ef_default(&self) -> String {
        self.suggested_ef.clone().unwrap_or_default()
    }

    /// Value shown in (and reported from) the ejection fraction field.
    pub fn ejection_fraction(&self) -> String {
        self.fields
            .ejection_fraction
            .clone()
            .unwrap_or_else(|| self.ef_default())
    }

    /// Stores submitted text fields. The ejection fraction is only kept as a
    /// user value when it differs from the default it was rendered with.
    pub fn apply_form(&mut self, form: &FormSubmission) {
        self.fields.patient_name = form.patient_name.clone();
        self.fields.conclusion = form.conclusion.clone();
        self.fields.ejection_fraction = if form.ejection_fraction != form.ef_default {
            Some(form.ejection_fraction.clone())
        } else {
            None
        };
    }

    /// Stores a new OCR suggestion. Last one wins.
    pub fn record_suggestion(&mut self, value: String) {
        self.suggested_ef = Some(value);
        self.ocr_error = None;
    }

    pub fn record_ocr_error(&mut self, message: String) {
        self.ocr_error = Some(message);
    }

    /// Builds the report draft from the current state.
    pub fn draft(&self, study_date: &str) -> ReportDraft {
        ReportDraft {
            patient_name: self.fields.patient_name.clone(),
            study_date: study_date.to_string(),
            ejection_fraction: self.ejection_fraction(),
            conclusion: self.fields.conclusion.clone(),
            images: self.images.iter().map(UploadedImage::to_report_image).collect(),
        }
    }
}
