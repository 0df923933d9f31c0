//! Prompt specifications and the response schemas they request.
//!
//! A [`PromptSpec`] is what the model client sends; its
//! [`ResponseSchema`] is what the response parser validates against.

use crate::operation::OperationKind;
use serde::Serialize;
use serde_json::json;

/// The structured shape a response must take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSchema {
    Extraction,
    TypeDetection,
    Question,
    Summary,
    Analysis,
    TaskClassification,
}

impl ResponseSchema {
    /// The schema each operation expects back.
    pub fn for_operation(operation: OperationKind) -> Self {
        match operation {
            OperationKind::Extract => ResponseSchema::Extraction,
            OperationKind::DetectType => ResponseSchema::TypeDetection,
            OperationKind::Ask => ResponseSchema::Question,
            OperationKind::Summarize => ResponseSchema::Summary,
            OperationKind::Analyze => ResponseSchema::Analysis,
            OperationKind::ClassifyTask => ResponseSchema::TaskClassification,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResponseSchema::Extraction => "extraction",
            ResponseSchema::TypeDetection => "type_detection",
            ResponseSchema::Question => "question",
            ResponseSchema::Summary => "summary",
            ResponseSchema::Analysis => "analysis",
            ResponseSchema::TaskClassification => "task_classification",
        }
    }

    /// Keys that must be present in the response object.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ResponseSchema::Extraction => &["fields", "confidence", "reasoning"],
            ResponseSchema::TypeDetection => &["form_type", "confidence", "reasoning"],
            ResponseSchema::Question => &["answer", "confidence", "evidence", "reasoning"],
            ResponseSchema::Summary => &["summary", "key_points", "important_values"],
            ResponseSchema::Analysis => &["answer", "insights", "statistics"],
            ResponseSchema::TaskClassification => &["task_type"],
        }
    }

    /// Keys the model may add.
    pub fn optional_fields(&self) -> &'static [&'static str] {
        match self {
            ResponseSchema::Extraction | ResponseSchema::Summary => &["form_type"],
            ResponseSchema::Analysis => &["comparisons"],
            ResponseSchema::TaskClassification => &["reasoning"],
            ResponseSchema::TypeDetection | ResponseSchema::Question => &[],
        }
    }

    /// JSON Schema embedded in the prompt.
    pub fn json_shape(&self) -> serde_json::Value {
        let confidence = json!({
            "type": "number",
            "description": "Confidence score between 0.0 and 1.0"
        });
        let properties = match self {
            ResponseSchema::Extraction => json!({
                "fields": {
                    "type": "object",
                    "description": "Field names mapped to values, or to {\"value\": ..., \"confidence\": ...}"
                },
                "form_type": {"type": "string", "description": "Type of form, if evident"},
                "confidence": confidence,
                "reasoning": {"type": "string", "description": "Explanation of the extraction"}
            }),
            ResponseSchema::TypeDetection => json!({
                "form_type": {
                    "type": "string",
                    "description": "Type of form (e.g., W-2, insurance_claim, job_application) or \"unknown\""
                },
                "confidence": confidence,
                "reasoning": {"type": "string", "description": "Why this type was chosen"}
            }),
            ResponseSchema::Question => json!({
                "answer": {"type": "string", "description": "The answer to the question"},
                "confidence": confidence,
                "evidence": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Verbatim excerpts from the document supporting the answer"
                },
                "reasoning": {"type": "string", "description": "How the answer was reached"}
            }),
            ResponseSchema::Summary => json!({
                "summary": {"type": "string", "description": "The document summary"},
                "key_points": {"type": "array", "items": {"type": "string"}},
                "important_values": {
                    "type": "object",
                    "description": "The most important values, name to value"
                },
                "form_type": {"type": "string"}
            }),
            ResponseSchema::Analysis => json!({
                "answer": {"type": "string", "description": "Direct answer to the question"},
                "insights": {"type": "array", "items": {"type": "string"}},
                "statistics": {
                    "type": "object",
                    "description": "Numeric statistics (totals, averages, counts), values are numbers or nested objects of numbers"
                },
                "comparisons": {"type": "object", "description": "Comparisons between documents"}
            }),
            ResponseSchema::TaskClassification => json!({
                "task_type": {
                    "type": "string",
                    "enum": ["extract", "qa", "summarize", "analyze"]
                },
                "reasoning": {"type": "string", "description": "Why this task type fits"}
            }),
        };

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_fields(),
        })
    }
}

/// A fully built prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptSpec {
    pub operation: OperationKind,
    /// System instructions for the operation.
    pub system: String,
    /// The user-turn text: documents, context and output directive.
    pub instruction_text: String,
    pub expected_schema: ResponseSchema,
}
