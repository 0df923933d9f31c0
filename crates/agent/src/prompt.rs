//! Prompt construction, one shape per operation kind.
//!
//! The builder is pure: the same context always yields the same
//! [`PromptSpec`]. Document text is embedded verbatim; a prompt that would
//! exceed the configured budget is rejected instead of truncated.

use formagent_config::PromptSettings;
use formagent_core::document::Document;
use formagent_core::error::{Error, Result};
use formagent_core::operation::{OperationKind, SummaryStyle};
use formagent_core::prompt::{PromptSpec, ResponseSchema};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write as _;

const EXTRACT_SYSTEM: &str = "You are an expert form analyzer. You read documents of any kind \
(tax forms, applications, claims, invoices, onboarding paperwork) and extract every field they \
contain with high accuracy. You never invent values that are not present in the document.";

const DETECT_TYPE_SYSTEM: &str = "You are an expert at classifying business and government \
forms. You identify what kind of form a document is from its structure, titles and fields.";

const ASK_SYSTEM: &str = "You are an expert at answering questions about forms. You answer only \
from the document provided, quote the exact text that supports your answer, and say so plainly \
when the document does not contain the answer.";

const SUMMARIZE_SYSTEM: &str = "You are an expert at summarizing forms. You capture the purpose \
of the document, the parties involved and the values that matter, without adding information \
that is not in the document.";

const ANALYZE_SYSTEM: &str = "You are an expert analyst of document collections. You compare \
forms, find patterns and discrepancies, and compute aggregate figures across documents. Every \
number you report must be derivable from the documents provided.";

const CLASSIFY_TASK_SYSTEM: &str = "You route requests about forms. Given a task description, \
you decide which single kind of form processing it asks for.";

/// What an operation needs to build its prompt.
#[derive(Debug, Clone, Copy)]
pub enum PromptContext<'a> {
    Extract {
        source: &'a str,
        text: &'a str,
    },
    DetectType {
        source: &'a str,
        text: &'a str,
        fields: &'a BTreeMap<String, String>,
    },
    Ask {
        document: &'a Document,
        question: &'a str,
    },
    Summarize {
        document: &'a Document,
        style: SummaryStyle,
    },
    Analyze {
        documents: &'a [Document],
        question: &'a str,
    },
    ClassifyTask {
        task: &'a str,
        question: Option<&'a str>,
        document_count: usize,
    },
}

impl PromptContext<'_> {
    pub fn operation(&self) -> OperationKind {
        match self {
            PromptContext::Extract { .. } => OperationKind::Extract,
            PromptContext::DetectType { .. } => OperationKind::DetectType,
            PromptContext::Ask { .. } => OperationKind::Ask,
            PromptContext::Summarize { .. } => OperationKind::Summarize,
            PromptContext::Analyze { .. } => OperationKind::Analyze,
            PromptContext::ClassifyTask { .. } => OperationKind::ClassifyTask,
        }
    }
}

/// Builds operation prompts within a character budget.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_prompt_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_settings(&PromptSettings::default())
    }
}

impl PromptBuilder {
    pub fn new(max_prompt_chars: usize) -> Self {
        Self { max_prompt_chars }
    }

    pub fn from_settings(settings: &PromptSettings) -> Self {
        Self::new(settings.max_prompt_chars)
    }

    pub fn max_prompt_chars(&self) -> usize {
        self.max_prompt_chars
    }

    /// Build the prompt for `context`.
    pub fn build(&self, context: PromptContext<'_>) -> Result<PromptSpec> {
        let operation = context.operation();
        let schema = ResponseSchema::for_operation(operation);

        let (system, mut text) = match context {
            PromptContext::Extract { source, text } => (EXTRACT_SYSTEM, extract_body(source, text)),
            PromptContext::DetectType {
                source,
                text,
                fields,
            } => (DETECT_TYPE_SYSTEM, detect_type_body(source, text, fields)),
            PromptContext::Ask { document, question } => (ASK_SYSTEM, ask_body(document, question)),
            PromptContext::Summarize { document, style } => {
                (SUMMARIZE_SYSTEM, summarize_body(document, style))
            }
            PromptContext::Analyze {
                documents,
                question,
            } => (ANALYZE_SYSTEM, analyze_body(documents, question)),
            PromptContext::ClassifyTask {
                task,
                question,
                document_count,
            } => (
                CLASSIFY_TASK_SYSTEM,
                classify_task_body(task, question, document_count),
            ),
        };

        text.push_str(&schema_directive(schema));

        let size = system.chars().count() + text.chars().count();
        if size > self.max_prompt_chars {
            return Err(Error::PromptTooLarge {
                size,
                budget: self.max_prompt_chars,
            });
        }

        Ok(PromptSpec {
            operation,
            system: system.to_string(),
            instruction_text: text,
            expected_schema: schema,
        })
    }
}

fn extract_body(source: &str, text: &str) -> String {
    let mut out = String::from(
        "Extract all fields and their values from the form below.\n\n\
         Instructions:\n\
         1. Identify every field, including key-value pairs, table cells, checkboxes and \
         signature or date lines.\n\
         2. Use concise snake_case names for fields (e.g. employee_name, box_1_wages).\n\
         3. Copy values exactly as written; leave out fields that are blank.\n\
         4. Mask social security numbers to their last 4 digits (e.g. ***-**-1234).\n\
         5. If the kind of form is evident, report it as form_type.\n\
         6. You may give a per-field confidence by writing a field as \
         {\"value\": ..., \"confidence\": ...}.\n\n",
    );
    push_document(&mut out, source, None, text);
    out
}

fn detect_type_body(source: &str, text: &str, fields: &BTreeMap<String, String>) -> String {
    let mut out = String::from(
        "Determine what type of form the document below is. Use a short, conventional name \
         such as W-2, 1099-MISC, insurance_claim, job_application or invoice. Answer \
         \"unknown\" if the type cannot be determined.\n\n",
    );
    push_fields(&mut out, fields);
    push_document(&mut out, source, None, text);
    out
}

fn ask_body(document: &Document, question: &str) -> String {
    let mut out = String::from(
        "Answer the question using only the form below.\n\
         Put the exact excerpts that support your answer, copied verbatim from the document, \
         in evidence. If the document does not answer the question, say so in answer, use a \
         low confidence and leave evidence empty.\n\n",
    );
    let _ = writeln!(out, "Question: {question}\n");
    push_fields(&mut out, document.extracted_fields());
    push_document(
        &mut out,
        document.source(),
        Some(document.form_type_label()),
        document.raw_text(),
    );
    out
}

fn summarize_body(document: &Document, style: SummaryStyle) -> String {
    let mut out = String::from(match style {
        SummaryStyle::Concise => {
            "Write a concise summary of the form below in 2-3 sentences, with at most 5 key \
             points and only the most important values.\n\n"
        }
        SummaryStyle::Detailed => {
            "Write a detailed summary of the form below. Cover its purpose, the parties \
             involved, every section and the notable values, with key points for each \
             important finding.\n\n"
        }
    });
    push_fields(&mut out, document.extracted_fields());
    push_document(
        &mut out,
        document.source(),
        Some(document.form_type_label()),
        document.raw_text(),
    );
    out
}

fn analyze_body(documents: &[Document], question: &str) -> String {
    let mut out = format!(
        "Analyze the {} forms below together and answer the question.\n\
         Identify patterns, trends and discrepancies across the forms and report them as \
         insights. Report every aggregate you compute (totals, averages, counts, minimums, \
         maximums) in the statistics object as numbers, using names like average_salary or \
         total_wages. Put document-by-document comparisons in comparisons.\n\n",
        documents.len()
    );
    let _ = writeln!(out, "Question: {question}\n");

    for (index, document) in documents.iter().enumerate() {
        let _ = writeln!(
            out,
            "=== Document {} of {} (id: {}) ===",
            index + 1,
            documents.len(),
            document.id()
        );
        push_fields(&mut out, document.extracted_fields());
        push_document(
            &mut out,
            document.source(),
            Some(document.form_type_label()),
            document.raw_text(),
        );
    }
    out
}

fn classify_task_body(task: &str, question: Option<&str>, document_count: usize) -> String {
    let mut out = String::from("Decide what kind of form processing this task needs.\n\n");
    let _ = writeln!(out, "Task: {task}");
    if let Some(question) = question {
        let _ = writeln!(out, "Question: {question}");
    }
    let _ = write!(
        out,
        "Number of documents: {document_count}\n\n\
         Task types:\n\
         - extract: the user wants to see the fields of the forms\n\
         - qa: the user asks a specific question about the forms\n\
         - summarize: the user wants a summary of the forms\n\
         - analyze: the user wants analysis or comparison across forms\n\n"
    );
    out
}

fn push_fields(out: &mut String, fields: &BTreeMap<String, String>) {
    if fields.is_empty() {
        return;
    }
    let rendered: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    let _ = write!(out, "Previously extracted fields:\n{:#}\n\n", Value::Object(rendered));
}

fn push_document(out: &mut String, source: &str, form_type: Option<&str>, text: &str) {
    let _ = write!(out, "<document source={source:?}");
    if let Some(form_type) = form_type {
        let _ = write!(out, " form_type={form_type:?}");
    }
    let _ = write!(out, ">\n{text}\n</document>\n\n");
}

fn schema_directive(schema: ResponseSchema) -> String {
    let shape = schema.json_shape();
    let mut out = format!(
        "Respond with a single JSON object in a ```json code block. \
         Required fields: {}.",
        schema.required_fields().join(", ")
    );
    if !schema.optional_fields().is_empty() {
        let _ = write!(out, " Optional fields: {}.", schema.optional_fields().join(", "));
    }
    if schema == ResponseSchema::Analysis {
        out.push_str(" The statistics object is required even if it is empty.");
    }
    let _ = write!(
        out,
        " Confidence values are numbers between 0.0 and 1.0.\n\nSchema:\n{shape:#}\n"
    );
    out
}
