//! Static HTML report
//!
//! Screenshots are embedded as base64 data URIs, so the report is a single
//! self-contained file.

use crate::model::UrlResult;
use crate::summary::Summary;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Local};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;
use std::path::Path;

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; }
        table { border-collapse: collapse; width: 100%; table-layout: auto; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; vertical-align: top; word-wrap: break-word; }
        th { background-color: #f2f2f2; }
        .screenshot { max-width: 50%; height: auto; cursor: pointer; }
        .fullscreen { position: fixed; top: 0; left: 0; width: 100%; height: 100%; background-color: rgba(0,0,0,0.9); display: flex; justify-content: center; align-items: center; z-index: 1000; }
        .fullscreen img { max-width: 90%; max-height: 90%; object-fit: contain; }
        .summary { background-color: #e6f3ff; padding: 10px; margin-bottom: 20px; border-radius: 5px; }
        .redirect { color: #888; font-size: 0.9em; }
        .url-column, .title-column, .screenshot-column { width: 30%; }
        .status-column { width: 10%; }
"#;

const SCRIPT: &str = r#"
    <div id="fullscreenContainer" class="fullscreen" style="display: none;" onclick="this.style.display='none';">
        <img id="fullscreenImage" src="" alt="Fullscreen Screenshot">
    </div>
    <script>
        function showFullscreen(img) {
            document.getElementById('fullscreenImage').src = img.src;
            document.getElementById('fullscreenContainer').style.display = 'flex';
        }
    </script>
"#;

/// Render the full report document
///
/// Rows follow input order regardless of the order results arrived in.
pub fn render_html(results: &[UrlResult], summary: &Summary, generated: DateTime<Local>) -> String {
    let mut ordered: Vec<&UrlResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.index);

    let mut html = String::with_capacity(4096 + results.iter().map(|r| r.screenshot.len() * 4 / 3).sum::<usize>());

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"utf-8\">\n    <title>URL Check Results</title>\n    <style>");
    html.push_str(STYLE);
    html.push_str("    </style>\n</head>\n<body>\n");

    let _ = write!(
        html,
        r#"    <div class="summary">
        <h2>Summary</h2>
        <p>Generated: {}</p>
        <p>Total URLs: {}</p>
        <p>Accessible URLs: {}</p>
        <p>Inaccessible URLs: {}</p>
        <p>Redirected URLs: {}</p>
    </div>
"#,
        generated.format("%Y-%m-%d %H:%M:%S"),
        summary.total,
        summary.accessible,
        summary.inaccessible,
        summary.redirected
    );

    html.push_str(
        r#"    <table>
        <tr>
            <th>#</th>
            <th class="url-column">URL</th>
            <th class="title-column">Title</th>
            <th class="status-column">Status</th>
            <th class="screenshot-column">Screenshot</th>
        </tr>
"#,
    );

    for (row, result) in ordered.iter().filter(|r| r.is_accessible()).enumerate() {
        render_row(&mut html, row + 1, result);
    }
    html.push_str("    </table>\n");

    let inaccessible: Vec<&&UrlResult> = ordered.iter().filter(|r| !r.is_accessible()).collect();
    if !inaccessible.is_empty() {
        html.push_str("    <h2>Inaccessible URLs</h2>\n    <ol>\n");
        for result in inaccessible {
            let _ = writeln!(html, "        <li>{}</li>", encode_text(&result.original_url));
        }
        html.push_str("    </ol>\n");
    }

    html.push_str(SCRIPT);
    html.push_str("</body>\n</html>\n");
    html
}

fn render_row(html: &mut String, row: usize, result: &UrlResult) {
    let href = encode_double_quoted_attribute(&result.final_url);
    let link_text = encode_text(&result.final_url);

    let redirect_note = if result.was_redirected {
        format!(
            r#"<div class="redirect">from {}</div>"#,
            encode_text(&result.original_url)
        )
    } else {
        String::new()
    };

    let screenshot = if result.has_screenshot() {
        format!(
            r#"<img class="screenshot" src="data:image/png;base64,{}" alt="Screenshot" onclick="showFullscreen(this)">"#,
            BASE64.encode(&result.screenshot)
        )
    } else {
        "No screenshot available".to_string()
    };

    let _ = write!(
        html,
        r#"        <tr>
            <td>{row}</td>
            <td class="url-column"><a href="{href}" target="_blank">{link_text}</a>{redirect_note}</td>
            <td class="title-column">{title}</td>
            <td class="status-column">{status}</td>
            <td class="screenshot-column">{screenshot}</td>
        </tr>
"#,
        title = encode_text(&result.title),
        status = result.status_code,
    );
}

/// Write the rendered report to `path`
pub async fn write_report(path: &Path, html: &str) -> std::io::Result<()> {
    tokio::fs::write(path, html).await
}
