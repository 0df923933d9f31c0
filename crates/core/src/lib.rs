//! # FormAgent Core
//!
//! Domain types, traits, and error definitions for FormAgent.
//! This crate has **no framework dependencies**: it defines the document
//! model and result records that every other crate works against.
//!
//! ## Layout
//!
//! - [`document`]: the immutable processed [`Document`]
//! - [`result`]: structured records parsed from model output
//! - [`operation`]: the closed set of operation kinds and summary styles
//! - [`prompt`]: built prompts and the response schemas they request
//! - [`provider`]: the trait every reasoning backend implements
//! - [`ledger`]: the injectable, atomic model-call counter
//! - [`loader`]: the document-loading collaborator seam

pub mod error;
pub mod document;
pub mod result;
pub mod operation;
pub mod prompt;
pub mod provider;
pub mod ledger;
pub mod loader;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result};
pub use document::{Document, DocumentId, ExtractedField};
pub use result::{
    AnalysisResult, ExtractionResult, QuestionResult, Statistic, Statistics, SummaryResult,
    TaskClassification, TypeDetection,
};
pub use operation::{OperationKind, SummaryStyle, TaskKind};
pub use prompt::{PromptSpec, ResponseSchema};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use ledger::{CallLedger, LedgerSnapshot};
pub use loader::{DocumentLoader, LoadedSource};
