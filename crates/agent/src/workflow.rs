//! Free-form task workflows.
//!
//! The forms are processed first, the model then classifies the task, and
//! the agent runs the matching operation over the processed forms.

use crate::orchestrator::FormAgent;
use formagent_core::document::Document;
use formagent_core::error::{Error, Result};
use formagent_core::operation::{SummaryStyle, TaskKind};
use formagent_core::result::{AnalysisResult, QuestionResult, SummaryResult, TaskClassification};
use serde::Serialize;
use tracing::info;

/// What a workflow produced, by task kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "result", rename_all = "snake_case")]
pub enum WorkflowOutput {
    /// The processed documents are the answer.
    Extraction,
    Answer(QuestionResult),
    Summaries(Vec<SummaryResult>),
    Analysis(AnalysisResult),
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub task: String,
    pub classification: TaskClassification,
    pub documents: Vec<Document>,
    pub output: WorkflowOutput,
}

impl FormAgent {
    /// Process `sources`, classify `task` and run the operation it calls
    /// for.
    ///
    /// Questions go to `ask` for one form and to `analyze` for several.
    /// `question`, when given, is what gets asked; otherwise the task text
    /// is. Summaries use the detailed style.
    pub async fn run_workflow<S: AsRef<str>>(
        &self,
        task: &str,
        sources: &[S],
        question: Option<&str>,
    ) -> Result<WorkflowResult> {
        let task = task.trim();
        if task.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        if sources.is_empty() {
            return Err(Error::InsufficientDocuments);
        }
        let question = question.map(str::trim).filter(|q| !q.is_empty());

        let documents = self.process_forms(sources).await?;
        let classification = self
            .classify_task(task, question, documents.len())
            .await?;
        info!(
            task = %classification.task,
            documents = documents.len(),
            "Running workflow"
        );

        let asked = question.unwrap_or(task);
        let output = match classification.task {
            TaskKind::Extract => WorkflowOutput::Extraction,
            TaskKind::Question => match documents.as_slice() {
                [only] => WorkflowOutput::Answer(self.ask(asked, only).await?),
                many => WorkflowOutput::Analysis(self.analyze(asked, many).await?),
            },
            TaskKind::Summarize => {
                let mut summaries = Vec::with_capacity(documents.len());
                for document in &documents {
                    summaries.push(self.summarize_with(document, SummaryStyle::Detailed).await?);
                }
                WorkflowOutput::Summaries(summaries)
            }
            TaskKind::Analyze => WorkflowOutput::Analysis(self.analyze(asked, &documents).await?),
        };

        Ok(WorkflowResult {
            task: task.to_string(),
            classification,
            documents,
            output,
        })
    }
}
