//! The form agent: one method per use case.
//!
//! Every operation runs prompt building, one model invocation and response
//! parsing in sequence. `process_form` is the exception with two
//! invocations (extract, then detect type). The agent keeps no documents
//! or results between calls; the only shared state is the call ledger.

use crate::loader::TextFileLoader;
use crate::parser::ResponseParser;
use crate::prompt::{PromptBuilder, PromptContext};
use crate::stats;
use formagent_config::AppConfig;
use formagent_core::document::{Document, validate_raw_text};
use formagent_core::error::{Error, Result};
use formagent_core::ledger::CallLedger;
use formagent_core::loader::{DocumentLoader, LoadedSource};
use formagent_core::operation::SummaryStyle;
use formagent_core::result::{
    AnalysisResult, ExtractionResult, QuestionResult, SummaryResult, TaskClassification,
    TypeDetection,
};
use formagent_providers::{ClientConfig, ModelClient, build_provider};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// The question `compare` asks about a pair of forms.
pub const COMPARE_QUESTION: &str = "Compare these two forms. What are the similarities and \
differences? Identify matching fields and highlight any discrepancies.";

/// Source label for text passed in directly.
const INLINE_SOURCE: &str = "inline";

/// Orchestrates prompt building, model calls and parsing for forms.
pub struct FormAgent {
    client: ModelClient,
    builder: PromptBuilder,
    parser: ResponseParser,
    loader: Arc<dyn DocumentLoader>,
    cancel: CancellationToken,
}

impl FormAgent {
    /// Create an agent with default prompt and parser settings and the
    /// plain-text file loader.
    pub fn new(client: ModelClient) -> Self {
        Self {
            client,
            builder: PromptBuilder::default(),
            parser: ResponseParser::default(),
            loader: Arc::new(TextFileLoader::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Build the provider and client from configuration.
    ///
    /// Fails with `Authentication` before any network call when the
    /// provider needs a key and none is configured.
    pub fn from_config(config: &AppConfig, ledger: Arc<CallLedger>) -> Result<Self> {
        let provider = build_provider(config)?;
        let client = ModelClient::new(provider, ClientConfig::from_settings(config), ledger);
        Ok(Self::new(client)
            .with_prompt_builder(PromptBuilder::from_settings(&config.prompt))
            .with_parser(ResponseParser::from_settings(&config.parser)))
    }

    pub fn with_prompt_builder(mut self, builder: PromptBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Use `token` to cancel in-flight and future model calls.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn ledger(&self) -> &Arc<CallLedger> {
        self.client.ledger()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Build, send and return the raw reply for one operation.
    async fn invoke(&self, context: PromptContext<'_>) -> Result<String> {
        let spec = self.builder.build(context)?;
        debug!(
            operation = %spec.operation,
            schema = spec.expected_schema.name(),
            prompt_chars = spec.instruction_text.len(),
            "Built prompt"
        );
        self.client.invoke(&spec, &self.cancel).await
    }

    /// Load `source` and process it into a [`Document`].
    pub async fn process_form(&self, source: &str) -> Result<Document> {
        let loaded = self.loader.load(source).await?;
        self.process_loaded(loaded).await
    }

    /// Process text that is already in memory.
    pub async fn process_text(&self, source: &str, raw_text: &str) -> Result<Document> {
        self.process_loaded(LoadedSource::inline(source, raw_text))
            .await
    }

    /// Process several sources in order, stopping at the first failure.
    pub async fn process_forms<S: AsRef<str>>(&self, sources: &[S]) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(sources.len());
        for source in sources {
            documents.push(self.process_form(source.as_ref()).await?);
        }
        Ok(documents)
    }

    async fn process_loaded(&self, loaded: LoadedSource) -> Result<Document> {
        validate_raw_text(&loaded.raw_text)?;

        let extraction = self.extract(&loaded.source, &loaded.raw_text).await?;
        let detection = self
            .detect(&loaded.source, &loaded.raw_text, &extraction.fields)
            .await?;

        let document = Document::assemble(loaded, extraction, detection)?;
        info!(
            source = document.source(),
            form_type = document.form_type_label(),
            fields = document.extracted_fields().len(),
            confidence = document.extraction_confidence(),
            "Processed form"
        );
        Ok(document)
    }

    /// One EXTRACT call over `raw_text`.
    pub async fn extract_fields(&self, raw_text: &str) -> Result<ExtractionResult> {
        validate_raw_text(raw_text)?;
        self.extract(INLINE_SOURCE, raw_text).await
    }

    /// One DETECT_TYPE call, with `fields` as extra context.
    pub async fn detect_type(
        &self,
        raw_text: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<TypeDetection> {
        validate_raw_text(raw_text)?;
        self.detect(INLINE_SOURCE, raw_text, fields).await
    }

    async fn extract(&self, source: &str, text: &str) -> Result<ExtractionResult> {
        let raw = self.invoke(PromptContext::Extract { source, text }).await?;
        self.parser.parse_extraction(&raw)
    }

    async fn detect(
        &self,
        source: &str,
        text: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<TypeDetection> {
        let raw = self
            .invoke(PromptContext::DetectType {
                source,
                text,
                fields,
            })
            .await?;
        self.parser.parse_type_detection(&raw)
    }

    /// Answer `question` about one document.
    pub async fn ask(&self, question: &str, document: &Document) -> Result<QuestionResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let raw = self.invoke(PromptContext::Ask { document, question }).await?;
        self.parser.parse_question(&raw)
    }

    /// Summarize a document; `style` is `concise` or `detailed`.
    pub async fn summarize(&self, document: &Document, style: &str) -> Result<SummaryResult> {
        let style: SummaryStyle = style.parse()?;
        self.summarize_with(document, style).await
    }

    pub async fn summarize_with(
        &self,
        document: &Document,
        style: SummaryStyle,
    ) -> Result<SummaryResult> {
        let raw = self
            .invoke(PromptContext::Summarize { document, style })
            .await?;
        self.parser.parse_summary(&raw)
    }

    /// Answer `question` across `documents` in one call, then cross-check
    /// the reported statistics against the extracted fields.
    pub async fn analyze(
        &self,
        question: &str,
        documents: &[Document],
    ) -> Result<AnalysisResult> {
        if documents.is_empty() {
            return Err(Error::InsufficientDocuments);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let raw = self
            .invoke(PromptContext::Analyze {
                documents,
                question,
            })
            .await?;
        let mut result = self.parser.parse_analysis(&raw)?;

        let disagreements = stats::cross_check(&mut result, documents);
        info!(
            documents = documents.len(),
            statistics = result.statistics.len(),
            disagreements,
            "Analysis complete"
        );
        Ok(result)
    }

    /// Decide which operation a free-form `task` calls for.
    pub async fn classify_task(
        &self,
        task: &str,
        question: Option<&str>,
        document_count: usize,
    ) -> Result<TaskClassification> {
        let task = task.trim();
        if task.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let raw = self
            .invoke(PromptContext::ClassifyTask {
                task,
                question,
                document_count,
            })
            .await?;
        self.parser.parse_task_classification(&raw)
    }

    /// Compare two documents.
    pub async fn compare(&self, first: &Document, second: &Document) -> Result<AnalysisResult> {
        self.analyze(COMPARE_QUESTION, &[first.clone(), second.clone()])
            .await
    }
}
