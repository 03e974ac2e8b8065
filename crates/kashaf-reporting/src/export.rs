use std::io::Write;
use std::path::Path;

use kashaf_core::{CategorySummary, IndexRecord};

use crate::{COLUMNS, ExportError, ExportFormat, xlsx};

/// Render records in the given format.
pub fn render(records: &[IndexRecord], format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Xlsx => xlsx::write_workbook(records),
        ExportFormat::Csv => Ok(export_csv(records).into_bytes()),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(records)?),
        ExportFormat::Markdown => Ok(export_markdown(records).into_bytes()),
    }
}

/// Export records to the given path.
pub fn export_records(
    records: &[IndexRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let content = render(records, format)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(&content)?;
    tracing::info!(
        path = %path.display(),
        format = format.label(),
        records = records.len(),
        "exported index"
    );
    Ok(())
}

fn csv_escape(s: &str) -> String {
    if s.contains('"') || s.contains(',') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// Leading BOM so spreadsheet apps pick UTF-8 for the Arabic text.
fn export_csv(records: &[IndexRecord]) -> String {
    let mut out = String::from("\u{feff}");
    out.push_str(&COLUMNS.join(","));
    out.push('\n');
    for r in records {
        let row = [
            csv_escape(&r.excerpt),
            csv_escape(&r.category),
            csv_escape(&r.title),
            csv_escape(&r.rationale),
            csv_escape(&r.page.to_string()),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn md_escape(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', "<br>")
}

fn export_markdown(records: &[IndexRecord]) -> String {
    let mut out = String::from("# الكشافات\n\n");

    if records.is_empty() {
        out.push_str("_لا توجد كشافات._\n");
        return out;
    }

    let summary = CategorySummary::from_records(records);
    for (category, count) in &summary.by_category {
        if *count > 0 {
            out.push_str(&format!("- {}: {}\n", category.label(), count));
        }
    }
    if summary.other > 0 {
        out.push_str(&format!("- تصنيفات أخرى: {}\n", summary.other));
    }
    out.push_str(&format!(
        "- **المجموع:** {} ({} بلا رقم صفحة)\n\n",
        summary.total, summary.unknown_pages
    ));

    out.push_str(&format!("| {} |\n", COLUMNS.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(COLUMNS.len())));
    for r in records {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            md_escape(&r.excerpt),
            md_escape(&r.category),
            md_escape(&r.title),
            md_escape(&r.rationale),
            r.page
        ));
    }
    out
}
