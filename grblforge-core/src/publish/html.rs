use crate::build::{BuildReport, BuildStatus, MachineReport};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Firmware Downloads</title>
    <style>
        body { font-family: -apple-system, system-ui, "Segoe UI", Roboto, Arial, sans-serif; max-width: 800px; margin: 40px auto; padding: 20px; line-height: 1.6; background-color: #f4f6f8; color: #333; }
        h1 { border-bottom: 2px solid #0056b3; padding-bottom: 10px; color: #0056b3; }
        .card { background: white; border-radius: 8px; padding: 20px; margin-bottom: 20px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .machine-title { font-size: 1.5em; font-weight: bold; margin-bottom: 10px; }
        .variant { margin-top: 15px; border-top: 1px solid #eee; padding-top: 10px; }
        .btn { display: inline-block; background-color: #28a745; color: white; padding: 8px 15px; text-decoration: none; border-radius: 4px; font-weight: bold; }
        .btn:hover { background-color: #218838; }
        .meta { font-size: 0.85em; color: #666; margin-top: 5px; }
        .failed { color: red; }
        .missing { color: orange; }
    </style>
</head>
<body>
"#;

/// Escape text for HTML element content and quoted attributes.
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

/// Render the download page: one card per machine, one row per variant.
pub fn render_download_page(report: &BuildReport, date: &str) -> String {
    let mut html = String::from(PAGE_HEAD);
    html.push_str(&format!(
        "    <h1>Firmware Builds ({})</h1>\n",
        escape_html(date)
    ));
    html.push_str(&format!(
        "    <p>{} of {} variants built successfully.</p>\n",
        report.succeeded(),
        report.total()
    ));
    for machine in &report.machines {
        render_machine(&mut html, machine);
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn render_machine(html: &mut String, machine: &MachineReport) {
    html.push_str("    <div class='card'>\n");
    html.push_str(&format!(
        "        <div class='machine-title'>{}</div>\n",
        escape_html(&machine.label)
    ));
    html.push_str(&format!(
        "        <div class='meta'>Board: {} | Driver: {}</div>\n",
        escape_html(&machine.board_symbol),
        escape_html(&machine.driver)
    ));

    for entry in &machine.entries {
        let variant = escape_html(&entry.variant);
        let row = match &entry.status {
            BuildStatus::Built { artifact } => {
                let file = artifact
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let ext = artifact
                    .extension()
                    .map(|e| e.to_string_lossy().to_uppercase())
                    .unwrap_or_default();
                format!(
                    "<strong>{}</strong><br><a href='{}' class='btn' download>Download .{}</a>",
                    variant,
                    escape_html(&file),
                    escape_html(&ext)
                )
            }
            BuildStatus::ArtifactMissing => format!(
                "<strong>{}</strong>: <span class='missing'>Artifact not found</span>",
                variant
            ),
            BuildStatus::Failed { .. } => format!(
                "<strong>{}</strong>: <span class='failed'>Build Failed</span>",
                variant
            ),
        };
        html.push_str(&format!("        <div class='variant'>{}</div>\n", row));
    }

    html.push_str("    </div>\n");
}
