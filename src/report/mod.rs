//! Echocardiography report assembly.
//!
//! This module provides:
//! - The report draft built from the session at generate time
//! - Annex grid layout (two images per row, upload order)
//! - Rendering to a packed .docx byte buffer

pub mod annex;
pub mod document;

pub use document::render_docx;

/// Content type of the generated download.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const TITLE: &str = "ECHOCARDIOGRAPHY REPORT";
pub const PATIENT_LABEL: &str = "Patient: ";
pub const RESULTS_HEADING: &str = "Results and Parameters";
pub const CONCLUSION_HEADING: &str = "Conclusion";
pub const ANNEX_HEADING: &str = "IMAGE ANNEX";
pub const EF_LABEL: &str = "Ejection Fraction (FEy)";

/// An annex image, already decoded once at upload.
#[derive(Debug, Clone)]
pub struct ReportImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Everything needed to render one report.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub patient_name: String,
    pub study_date: String,
    pub ejection_fraction: String,
    pub conclusion: String,
    /// Upload order
    pub images: Vec<ReportImage>,
}

impl ReportDraft {
    /// Header row followed by the single data row of the parameters table.
    pub fn parameter_rows(&self) -> [[String; 2]; 2] {
        [
            ["Parameter".to_string(), "Value".to_string()],
            [EF_LABEL.to_string(), format!("{}%", self.ejection_fraction)],
        ]
    }

    /// Download filename: `Informe_<name with spaces as underscores>.docx`
    pub fn filename(&self) -> String {
        report_filename(&self.patient_name)
    }
}

pub fn report_filename(patient_name: &str) -> String {
    format!("Informe_{}.docx", patient_name.replace(' ', "_"))
}
