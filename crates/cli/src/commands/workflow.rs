//! `formagent workflow`: Let the model route a free-form task.

use super::{Overrides, build_agent, print_usage};
use formagent_core::error::Result;

pub async fn run(
    overrides: &Overrides,
    task: &str,
    files: &[String],
    question: Option<&str>,
) -> Result<()> {
    let agent = build_agent(overrides)?;

    eprintln!("Running workflow: {task}");
    let result = agent.run_workflow(task, files, question).await?;

    println!();
    println!("Workflow type: {}", result.classification.task);
    if !result.classification.reasoning.is_empty() {
        println!("  ({})", result.classification.reasoning);
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    print_usage(&agent);
    Ok(())
}
