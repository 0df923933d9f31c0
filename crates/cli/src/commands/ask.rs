//! `formagent ask`: Ask a question about one form, or across several.

use super::analyze::print_analysis;
use super::{Overrides, build_agent, percent, print_usage, process_all};
use formagent_core::error::Result;

pub async fn run(overrides: &Overrides, files: &[String], question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(formagent_core::Error::EmptyQuestion);
    }

    let agent = build_agent(overrides)?;
    let documents = process_all(&agent, files).await?;

    println!("\n❓ {question}");

    if let [document] = documents.as_slice() {
        let result = agent.ask(question, document).await?;
        println!();
        println!("💡 {}", result.answer);
        println!("  Confidence: {}", percent(result.confidence));
        if !result.evidence.is_empty() {
            println!("  Evidence:");
            for excerpt in &result.evidence {
                println!("    \"{excerpt}\"");
            }
        }
        if !result.reasoning.is_empty() {
            println!("  Reasoning:  {}", result.reasoning);
        }
    } else {
        // Several forms: answer across all of them.
        let result = agent.analyze(question, &documents).await?;
        print_analysis(&result);
    }

    print_usage(&agent);
    Ok(())
}
