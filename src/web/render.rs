//! HTML rendering for the report form.
//!
//! Three panels: upload on the left, thumbnails in the middle, the report
//! fields on the right. The last two only appear once images are uploaded.

use crate::session::SessionState;

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn field_error(message: Option<&str>) -> String {
    match message {
        Some(msg) => format!(r#"<p class="error">{}</p>"#, escape_html(msg)),
        None => String::new(),
    }
}

fn render_upload_panel(state: &SessionState) -> String {
    format!(
        r#"<section class="panel">
  <h2>1. Screenshots</h2>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <input type="file" name="images" accept=".jpg,.jpeg,.png" multiple>
    <button type="submit">Upload</button>
  </form>
  {error}
  <form action="/reset" method="post"><button type="submit">New report</button></form>
</section>"#,
        error = field_error(state.upload_error.as_deref()),
    )
}

fn render_preview_panel(state: &SessionState) -> String {
    let thumbs: String = state
        .images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            format!(
                r#"<figure><img src="/images/{i}" alt="{name}"><figcaption>{n}. {name}</figcaption></figure>"#,
                i = i,
                n = i + 1,
                name = escape_html(&img.filename),
            )
        })
        .collect::<Vec<_>>()
        .join("\n    ");

    format!(
        r#"<section class="panel">
  <h2>2. Preview ({count})</h2>
  <div class="thumbs">
    {thumbs}
  </div>
</section>"#,
        count = state.images.len(),
        thumbs = thumbs,
    )
}

fn render_report_panel(state: &SessionState) -> String {
    format!(
        r#"<section class="panel">
  <h2>3. Report</h2>
  <form method="post" action="/generate">
    <label>Patient name <input type="text" name="patient_name" value="{name}"></label>
    <label>Ejection fraction (%) <input type="text" name="ejection_fraction" value="{ef}"></label>
    <input type="hidden" name="ef_default" value="{ef_default}">
    <button type="submit" formaction="/suggest">Suggest from first image</button>
    {ocr_error}
    <label>Conclusion <textarea name="conclusion" rows="6">{conclusion}</textarea></label>
    <button type="submit">Generate report</button>
  </form>
</section>"#,
        name = escape_html(&state.fields.patient_name),
        ef = escape_html(&state.ejection_fraction()),
        ef_default = escape_html(&state.ef_default()),
        ocr_error = field_error(state.ocr_error.as_deref()),
        conclusion = escape_html(&state.fields.conclusion),
    )
}

/// Renders the whole page for the session.
pub fn render_page(state: &SessionState) -> String {
    let mut panels = render_upload_panel(state);
    if state.has_images() {
        panels.push('\n');
        panels.push_str(&render_preview_panel(state));
        panels.push('\n');
        panels.push_str(&render_report_panel(state));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Echocardiography report</title>
<style>
  body {{ font-family: sans-serif; margin: 1.5rem; }}
  main {{ display: flex; gap: 1.5rem; align-items: flex-start; }}
  .panel {{ flex: 1; }}
  .thumbs {{ display: flex; flex-wrap: wrap; gap: .5rem; }}
  figure {{ margin: 0; }}
  label {{ display: block; margin: .5rem 0; }}
  input[type=text], textarea {{ width: 100%; }}
  .error {{ color: #b00020; }}
</style>
</head>
<body>
<h1>Echocardiography report</h1>
<main>
{panels}
</main>
</body>
</html>
"#,
        panels = panels,
    )
}
