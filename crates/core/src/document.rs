//! The processed document value object.
//!
//! A [`Document`] is produced once by the extraction flow and never mutated
//! afterwards. Re-extraction builds a new document; field maps are replaced
//! wholesale, never merged.

use crate::error::{Error, Result};
use crate::loader::LoadedSource;
use crate::result::{ExtractionResult, TypeDetection};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for a processed document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single extracted key/value pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedField {
    pub name: String,
    pub value: String,
    /// Per-field confidence when the model reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A fully processed form.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    id: DocumentId,
    source: String,
    file_type: String,
    raw_text: String,
    extracted_fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    field_confidences: BTreeMap<String, f64>,
    form_type: Option<String>,
    extraction_confidence: f64,
    type_confidence: f64,
    extraction_reasoning: String,
    processed_at: DateTime<Utc>,
}

/// Reject text that is empty after trimming whitespace.
pub fn validate_raw_text(raw_text: &str) -> Result<&str> {
    if raw_text.trim().is_empty() {
        return Err(Error::EmptyDocument);
    }
    Ok(raw_text)
}

impl Document {
    /// Merge the loaded text with the extraction and type-detection results.
    pub fn assemble(
        loaded: LoadedSource,
        extraction: ExtractionResult,
        detection: TypeDetection,
    ) -> Result<Self> {
        validate_raw_text(&loaded.raw_text)?;

        let form_type = detection
            .form_type
            .filter(|t| !t.trim().is_empty() && !t.trim().eq_ignore_ascii_case("unknown"))
            .or(extraction.form_type_hint);

        Ok(Self {
            id: DocumentId::new(),
            source: loaded.source,
            file_type: loaded.file_type,
            raw_text: loaded.raw_text,
            extracted_fields: extraction.fields,
            field_confidences: extraction.field_confidences,
            form_type,
            extraction_confidence: extraction.confidence.clamp(0.0, 1.0),
            type_confidence: detection.confidence.clamp(0.0, 1.0),
            extraction_reasoning: extraction.reasoning,
            processed_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Where the text came from (path or label).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn extracted_fields(&self) -> &BTreeMap<String, String> {
        &self.extracted_fields
    }

    /// Look up a single field value by exact name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.extracted_fields.get(name).map(String::as_str)
    }

    /// All fields with their optional per-field confidences.
    pub fn fields(&self) -> Vec<ExtractedField> {
        self.extracted_fields
            .iter()
            .map(|(name, value)| ExtractedField {
                name: name.clone(),
                value: value.clone(),
                confidence: self.field_confidences.get(name).copied(),
            })
            .collect()
    }

    /// The detected form type, `None` when it could not be determined.
    pub fn form_type(&self) -> Option<&str> {
        self.form_type.as_deref()
    }

    /// The form type for display, `"unknown"` when undetermined.
    pub fn form_type_label(&self) -> &str {
        self.form_type.as_deref().unwrap_or("unknown")
    }

    pub fn extraction_confidence(&self) -> f64 {
        self.extraction_confidence
    }

    pub fn type_confidence(&self) -> f64 {
        self.type_confidence
    }

    pub fn extraction_reasoning(&self) -> &str {
        &self.extraction_reasoning
    }

    pub fn processed_at(&self) -> DateTime<Utc> {
        self.processed_at
    }

    /// Pretty JSON for export.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Document {}
