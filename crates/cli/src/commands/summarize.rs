//! `formagent summarize`: Summarize forms, optionally as Markdown reports.

use super::{Overrides, build_agent, print_usage};
use formagent_agent::render_summary_report;
use formagent_core::document::Document;
use formagent_core::error::Result;
use formagent_core::operation::SummaryStyle;
use std::path::{Path, PathBuf};

pub async fn run(
    overrides: &Overrides,
    files: &[String],
    style: &str,
    report_dir: Option<&Path>,
) -> Result<()> {
    let style: SummaryStyle = style.parse()?;
    let agent = build_agent(overrides)?;

    if let Some(dir) = report_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    for file in files {
        eprintln!("  Processing {file}...");
        let document = agent.process_form(file).await?;
        let summary = agent.summarize_with(&document, style).await?;

        println!();
        println!("📄 {} ({})", document.source(), document.form_type_label());
        println!();
        println!("{}", summary.summary.trim());
        if !summary.key_points.is_empty() {
            println!();
            println!("Key points:");
            for point in &summary.key_points {
                println!("  - {point}");
            }
        }
        if !summary.important_values.is_empty() {
            println!();
            println!("Important values:");
            for (name, value) in &summary.important_values {
                println!("  {name}: {value}");
            }
        }

        if let Some(dir) = report_dir {
            let path = report_path(dir, &document);
            tokio::fs::write(&path, render_summary_report(&document, &summary)).await?;
            println!("\nReport saved to {}", path.display());
        }
    }

    print_usage(&agent);
    Ok(())
}

fn report_path(dir: &Path, document: &Document) -> PathBuf {
    let stem = Path::new(document.source())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("form");
    dir.join(format!("{stem}_summary.md"))
}
