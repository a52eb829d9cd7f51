//! .docx rendering with docx-rs.

use anyhow::{anyhow, Context, Result};
use docx_rs::{
    AlignmentType, BreakType, Docx, Paragraph, Pic, Run, Style, StyleType, Table, TableCell,
    TableRow,
};
use std::io::Cursor;
use tracing::{debug, info};

use super::annex::{annex_grid, AnnexCell};
use super::{
    ReportDraft, ReportImage, ANNEX_HEADING, CONCLUSION_HEADING, PATIENT_LABEL, RESULTS_HEADING,
    TITLE,
};

const EMU_PER_INCH: f32 = 914_400.0;

/// Caption font size in half-points (9 pt).
const CAPTION_SIZE: usize = 18;

/// Table grid widths in twips (two equal columns).
const TABLE_GRID: [usize; 2] = [4680, 4680];

fn heading_styles() -> [Style; 2] {
    [
        Style::new("Title", StyleType::Paragraph)
            .name("Title")
            .size(36)
            .bold(),
        Style::new("Heading1", StyleType::Paragraph)
            .name("Heading 1")
            .size(28)
            .bold(),
    ]
}

fn heading(text: &str, style: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(text))
        .style(style)
}

/// Adds one line per input line, separated by line breaks, to a single run.
fn multiline_run(text: &str) -> Run {
    let mut run = Run::new();
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    run
}

fn text_cell(text: &str, bold: bool) -> TableCell {
    let mut run = Run::new().add_text(text);
    if bold {
        run = run.bold();
    }
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}

fn parameter_table(draft: &ReportDraft) -> Table {
    let [header, data] = draft.parameter_rows();
    Table::new(vec![
        TableRow::new(vec![text_cell(&header[0], true), text_cell(&header[1], true)]),
        TableRow::new(vec![text_cell(&data[0], false), text_cell(&data[1], false)]),
    ])
    .set_grid(TABLE_GRID.to_vec())
}

/// Re-encodes an uploaded image to PNG at the annex display width.
fn annex_picture(image: &ReportImage, width_inches: f32) -> Result<Pic> {
    let decoded = image::load_from_memory(&image.bytes).context("Unreadable annex image")?;
    let mut png = Cursor::new(Vec::new());
    decoded
        .write_to(&mut png, image::ImageFormat::Png)
        .context("Failed to re-encode annex image")?;

    let width_emu = width_inches * EMU_PER_INCH;
    let height_emu = width_emu * image.height as f32 / image.width.max(1) as f32;

    Ok(Pic::new(&png.into_inner()).size(width_emu as u32, height_emu as u32))
}

fn annex_cell(cell: Option<AnnexCell>, images: &[ReportImage], width_inches: f32) -> Result<TableCell> {
    let Some(cell) = cell else {
        // A cell needs at least one paragraph to be valid OOXML
        return Ok(TableCell::new().add_paragraph(Paragraph::new()));
    };

    let pic = annex_picture(&images[cell.image_index], width_inches)?;
    Ok(TableCell::new()
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_image(pic))
                .align(AlignmentType::Center),
        )
        .add_paragraph(
            Paragraph::new()
                .add_run(
                    Run::new()
                        .add_text(cell.caption())
                        .italic()
                        .size(CAPTION_SIZE),
                )
                .align(AlignmentType::Center),
        ))
}

fn annex_table(images: &[ReportImage], width_inches: f32) -> Result<Table> {
    let mut rows = Vec::new();
    for row in annex_grid(images.len()) {
        let cells = row
            .into_iter()
            .map(|cell| annex_cell(cell, images, width_inches))
            .collect::<Result<Vec<_>>>()?;
        rows.push(TableRow::new(cells));
    }
    Ok(Table::new(rows).set_grid(TABLE_GRID.to_vec()))
}

/// Builds the full report document.
pub fn build_docx(draft: &ReportDraft, image_width_inches: f32) -> Result<Docx> {
    let [title_style, heading_style] = heading_styles();

    let mut docx = Docx::new()
        .add_style(title_style)
        .add_style(heading_style)
        .add_paragraph(heading(TITLE, "Title").align(AlignmentType::Center))
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(PATIENT_LABEL).bold())
                .add_run(
                    Run::new()
                        .add_text(&draft.patient_name)
                        .add_break(BreakType::TextWrapping)
                        .add_text(&draft.study_date),
                ),
        )
        .add_paragraph(heading(RESULTS_HEADING, "Heading1"))
        .add_table(parameter_table(draft))
        .add_paragraph(heading(CONCLUSION_HEADING, "Heading1"))
        .add_paragraph(Paragraph::new().add_run(multiline_run(&draft.conclusion)))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
        .add_paragraph(heading(ANNEX_HEADING, "Heading1").align(AlignmentType::Center));

    if !draft.images.is_empty() {
        docx = docx.add_table(annex_table(&draft.images, image_width_inches)?);
    }

    debug!("Built report with {} annex images", draft.images.len());
    Ok(docx)
}

/// Renders the report to an in-memory .docx.
pub fn render_docx(draft: &ReportDraft, image_width_inches: f32) -> Result<Vec<u8>> {
    let docx = build_docx(draft, image_width_inches)?;

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| anyhow!("Failed to serialize report: {}", e))?;

    let bytes = buf.into_inner();
    info!(
        "Rendered {} ({} bytes, {} images)",
        draft.filename(),
        bytes.len(),
        draft.images.len()
    );
    Ok(bytes)
}
