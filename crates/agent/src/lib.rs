//! The form agent: prompts in, structured results out.
//!
//! Each operation follows the same pipeline:
//!
//! 1. **Build** an operation-specific prompt ([`prompt`])
//! 2. **Invoke** the model once through the retrying client
//! 3. **Parse** the reply into a validated record ([`parser`])
//!
//! Multi-document analysis additionally cross-checks the model's
//! statistics against the extracted fields ([`stats`]). Free-form tasks are
//! classified and routed to one of these operations ([`workflow`]).

pub mod loader;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod report;
pub mod stats;
pub mod workflow;

#[cfg(test)]
mod test_helpers;

pub use loader::TextFileLoader;
pub use orchestrator::{COMPARE_QUESTION, FormAgent};
pub use parser::{ParsedResponse, ResponseParser};
pub use prompt::{PromptBuilder, PromptContext};
pub use report::render_summary_report;
pub use stats::{FieldAggregate, aggregate_fields, cross_check};
pub use workflow::{WorkflowOutput, WorkflowResult};
