use std::io::Write;
use std::path::Path;

use kashaf_core::config_file::ConfigFile;
use kashaf_core::{Category, CategorySummary, Config, IndexRecord, PageChunk, ProgressEvent};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Spinner text for a progress event.
pub fn progress_message(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Reading { source } => format!("Reading {}...", source),
        ProgressEvent::PagesSplit { pages } => format!("Found {} pages", pages),
        ProgressEvent::Requesting {
            backend,
            model,
            prompt_chars,
        } => format!(
            "Asking {} ({}) about {} characters...",
            model, backend, prompt_chars
        ),
        ProgressEvent::ReplyReceived { chars, elapsed } => {
            format!("Reply received ({} characters in {:.1?})", chars, elapsed)
        }
        ProgressEvent::Parsed {
            records,
            unknown_pages,
        } => format!("Parsed {} entries ({} without a page)", records, unknown_pages),
    }
}

/// Print every record as a numbered block.
pub fn print_records(
    w: &mut dyn Write,
    records: &[IndexRecord],
    color: ColorMode,
) -> std::io::Result<()> {
    if records.is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "No index entries found in the reply.".yellow())?;
        } else {
            writeln!(w, "No index entries found in the reply.")?;
        }
        return Ok(());
    }

    for (i, r) in records.iter().enumerate() {
        let page = r.page.to_string();
        if color.enabled() {
            writeln!(w, "{} {}", format!("[{}]", i + 1).bold().yellow(), r.title.bold())?;
            writeln!(w, "  Category:  {}", r.category.cyan())?;
            writeln!(w, "  Excerpt:   {}", truncate(&r.excerpt, 80))?;
            writeln!(w, "  Rationale: {}", truncate(&r.rationale, 120).dimmed())?;
            if r.page.is_unknown() {
                writeln!(w, "  Page:      {}", page.red())?;
            } else {
                writeln!(w, "  Page:      {}", page.green())?;
            }
        } else {
            writeln!(w, "[{}] {}", i + 1, r.title)?;
            writeln!(w, "  Category:  {}", r.category)?;
            writeln!(w, "  Excerpt:   {}", truncate(&r.excerpt, 80))?;
            writeln!(w, "  Rationale: {}", truncate(&r.rationale, 120))?;
            writeln!(w, "  Page:      {}", page)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Print per-category counts.
pub fn print_summary(
    w: &mut dyn Write,
    summary: &CategorySummary,
    pages: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", "SUMMARY".bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SUMMARY")?;
        writeln!(w, "{}", sep)?;
    }

    writeln!(w, "  Pages: {}", pages)?;
    writeln!(w, "  Entries: {}", summary.total)?;
    writeln!(w)?;

    for category in Category::ALL {
        let count = summary.count(category);
        if count == 0 {
            continue;
        }
        writeln!(
            w,
            "  {} ({}): {}",
            category.label(),
            category.english_name(),
            count
        )?;
    }
    if summary.other > 0 {
        let msg = format!("Other labels: {}", summary.other);
        if color.enabled() {
            writeln!(w, "  {}", msg.dimmed())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    if summary.unknown_pages > 0 {
        let msg = format!("Entries without a page: {}", summary.unknown_pages);
        if color.enabled() {
            writeln!(w, "  {}", msg.red())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print the page chunks of a document (dry run).
pub fn print_pages(
    w: &mut dyn Write,
    file_name: &str,
    pages: &[PageChunk],
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {} ({} pages)\n",
            "DRY RUN:".bold().cyan(),
            file_name.bold(),
            pages.len()
        )?;
    } else {
        writeln!(w, "DRY RUN: {} ({} pages)\n", file_name, pages.len())?;
    }

    if pages.is_empty() {
        writeln!(w, "No page markers found.")?;
        return Ok(());
    }

    for chunk in pages {
        let preview: String = chunk.content.split_whitespace().collect::<Vec<_>>().join(" ");
        let preview = truncate(&preview, 60);
        let length = chunk.content.chars().count();
        if color.enabled() {
            writeln!(
                w,
                "{} {} chars  {}",
                format!("[{}]", chunk.page).bold().yellow(),
                length,
                preview.dimmed()
            )?;
        } else {
            writeln!(w, "[{}] {} chars  {}", chunk.page, length, preview)?;
        }
    }
    Ok(())
}

/// Print the effective configuration with the credential masked.
pub fn print_config(
    w: &mut dyn Write,
    config: &Config,
    file: &ConfigFile,
    platform_path: Option<&Path>,
) -> std::io::Result<()> {
    writeln!(w, "model       = {}", config.model)?;
    writeln!(w, "base_url    = {}", config.base_url)?;
    writeln!(w, "temperature = {}", config.temperature)?;
    writeln!(
        w,
        "api_key     = {}",
        if config.credential().is_some() {
            "***"
        } else {
            "(not set)"
        }
    )?;

    let export = file.export.as_ref();
    writeln!(
        w,
        "format      = {}",
        export.and_then(|e| e.format.as_deref()).unwrap_or("xlsx")
    )?;
    writeln!(
        w,
        "output      = {}",
        export
            .and_then(|e| e.output.as_deref())
            .unwrap_or(kashaf_reporting::DEFAULT_FILENAME)
    )?;

    writeln!(w)?;
    match platform_path {
        Some(p) => writeln!(
            w,
            "config file: {}{}",
            p.display(),
            if p.exists() { "" } else { " (missing)" }
        )?,
        None => writeln!(w, "config file: (no config directory)")?,
    }
    Ok(())
}

/// Truncate to `max` characters, appending `...` when cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
