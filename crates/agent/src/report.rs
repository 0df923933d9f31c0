//! Markdown summary report for a processed form.

use formagent_core::document::Document;
use formagent_core::result::SummaryResult;
use std::fmt::Write as _;

/// Render `summary` of `document` as a Markdown report.
pub fn render_summary_report(document: &Document, summary: &SummaryResult) -> String {
    let mut out = String::from("# Form Summary Report\n\n");

    let form_type = summary
        .form_type
        .as_deref()
        .unwrap_or(document.form_type_label());
    let _ = writeln!(out, "**Source:** {}", document.source());
    let _ = writeln!(out, "**Form Type:** {form_type}");
    let _ = writeln!(
        out,
        "**Extraction Confidence:** {:.0}%",
        document.extraction_confidence() * 100.0
    );
    let _ = writeln!(
        out,
        "**Processed:** {}\n",
        document.processed_at().format("%Y-%m-%d %H:%M:%S UTC")
    );

    let _ = writeln!(out, "## Summary\n\n{}\n", summary.summary.trim());

    if !summary.key_points.is_empty() {
        out.push_str("## Key Points\n\n");
        for point in &summary.key_points {
            let _ = writeln!(out, "- {point}");
        }
        out.push('\n');
    }

    if !summary.important_values.is_empty() {
        out.push_str("## Important Values\n\n");
        for (name, value) in &summary.important_values {
            let _ = writeln!(out, "- **{name}:** {value}");
        }
        out.push('\n');
    }

    out.push_str("## All Extracted Fields\n\n");
    if document.extracted_fields().is_empty() {
        out.push_str("_No fields extracted._\n");
    } else {
        out.push_str("| Field | Value | Confidence |\n|---|---|---|\n");
        for field in document.fields() {
            let confidence = field
                .confidence
                .map(|c| format!("{:.0}%", c * 100.0))
                .unwrap_or_else(|| "-".into());
            let _ = writeln!(
                out,
                "| {} | {} | {confidence} |",
                field.name,
                field.value.replace('|', "\\|")
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::document;
    use std::collections::BTreeMap;

    #[test]
    fn report_has_every_section() {
        let doc = document(
            "Box 1 - Wages: $75,000.00",
            &[("box_1_wages", "$75,000.00"), ("employee", "Jane | Doe")],
        );
        let summary = SummaryResult {
            summary: "A W-2 for Jane Doe.".into(),
            key_points: vec!["Wages of $75,000".into()],
            important_values: BTreeMap::from([("wages".into(), "$75,000.00".into())]),
            form_type: Some("W-2".into()),
        };

        let report = render_summary_report(&doc, &summary);
        assert!(report.starts_with("# Form Summary Report"));
        assert!(report.contains("**Form Type:** W-2"));
        assert!(report.contains("**Extraction Confidence:** 90%"));
        assert!(report.contains("- Wages of $75,000"));
        assert!(report.contains("- **wages:** $75,000.00"));
        assert!(report.contains("| box_1_wages | $75,000.00 | - |"));
        assert!(report.contains("Jane \\| Doe"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let doc = document("text", &[]);
        let summary = SummaryResult {
            summary: "Nothing notable.".into(),
            key_points: vec![],
            important_values: BTreeMap::new(),
            form_type: None,
        };
        let report = render_summary_report(&doc, &summary);
        assert!(!report.contains("## Key Points"));
        assert!(report.contains("**Form Type:** unknown"));
        assert!(report.contains("_No fields extracted._"));
    }
}
