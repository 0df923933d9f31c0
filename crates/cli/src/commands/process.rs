//! `formagent process`: Extract fields and detect the form type.

use super::{Overrides, build_agent, percent, print_usage, process_all};
use formagent_core::document::Document;
use formagent_core::error::Result;
use std::path::Path;

pub async fn run(overrides: &Overrides, files: &[String], output: Option<&Path>) -> Result<()> {
    let agent = build_agent(overrides)?;
    let documents = process_all(&agent, files).await?;

    for document in &documents {
        print_document(document);
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&documents)?;
        tokio::fs::write(path, json).await?;
        println!("Saved {} document(s) to {}", documents.len(), path.display());
    }

    print_usage(&agent);
    Ok(())
}

pub fn print_document(document: &Document) {
    println!();
    println!("📄 {}", document.source());
    println!(
        "  Form type:   {} ({} confidence)",
        document.form_type_label(),
        percent(document.type_confidence())
    );
    println!(
        "  Extraction:  {} confidence",
        percent(document.extraction_confidence())
    );

    let fields = document.fields();
    println!("  Fields ({}):", fields.len());
    for field in fields {
        match field.confidence {
            Some(c) => println!("    {}: {} ({})", field.name, field.value, percent(c)),
            None => println!("    {}: {}", field.name, field.value),
        }
    }
}
