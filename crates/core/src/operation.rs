//! Operation kinds and summary styles.
//!
//! The operation kind decides both the prompt shape and the result schema,
//! so it is a closed enum rather than a free-form string.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One logical model operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Extract key/value fields from a document.
    Extract,
    /// Classify the form type of a document.
    DetectType,
    /// Answer a question about one document.
    Ask,
    /// Summarize one document.
    Summarize,
    /// Answer a question across several documents.
    Analyze,
    /// Decide which operation a free-form task calls for.
    ClassifyTask,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Extract => "extract",
            OperationKind::DetectType => "detect_type",
            OperationKind::Ask => "ask",
            OperationKind::Summarize => "summarize",
            OperationKind::Analyze => "analyze",
            OperationKind::ClassifyTask => "classify_task",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a free-form workflow task asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Show the extracted fields.
    Extract,
    /// Answer a specific question.
    #[serde(rename = "qa")]
    Question,
    /// Summarize each form.
    Summarize,
    /// Analyze or compare across forms.
    Analyze,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Extract => "extract",
            TaskKind::Question => "qa",
            TaskKind::Summarize => "summarize",
            TaskKind::Analyze => "analyze",
        }
    }
}

impl FromStr for TaskKind {
    type Err = String;

    /// Accepts the canonical names plus a few common synonyms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extract" | "extraction" => Ok(TaskKind::Extract),
            "qa" | "question" | "ask" => Ok(TaskKind::Question),
            "summarize" | "summary" => Ok(TaskKind::Summarize),
            "analyze" | "analysis" | "compare" => Ok(TaskKind::Analyze),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much detail a summary should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    Concise,
    #[default]
    Detailed,
}

impl SummaryStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStyle::Concise => "concise",
            SummaryStyle::Detailed => "detailed",
        }
    }
}

impl FromStr for SummaryStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concise" => Ok(SummaryStyle::Concise),
            "detailed" => Ok(SummaryStyle::Detailed),
            _ => Err(Error::InvalidStyle(s.to_string())),
        }
    }
}

impl std::fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
