//! `formagent analyze`: Answer a question across several forms.

use super::{Overrides, build_agent, print_usage, process_all};
use formagent_core::error::Result;
use formagent_core::result::{AnalysisResult, Statistic, Statistics};

pub async fn run(overrides: &Overrides, files: &[String], question: &str) -> Result<()> {
    let agent = build_agent(overrides)?;
    let documents = process_all(&agent, files).await?;

    let result = agent.analyze(question, &documents).await?;
    println!("\n❓ {question}");
    print_analysis(&result);

    print_usage(&agent);
    Ok(())
}

pub fn print_analysis(result: &AnalysisResult) {
    println!();
    println!("💡 {}", result.answer);

    if !result.insights.is_empty() {
        println!();
        println!("Insights:");
        for insight in &result.insights {
            println!("  - {insight}");
        }
    }

    if !result.statistics.is_empty() {
        println!();
        println!("Statistics:");
        print_statistics(&result.statistics, 1);
    }

    if !result.comparisons.is_empty() {
        println!();
        println!("Comparisons:");
        for (name, value) in &result.comparisons {
            match value.as_str() {
                Some(text) => println!("  {name}: {text}"),
                None => println!("  {name}: {value}"),
            }
        }
    }
}

fn print_statistics(stats: &Statistics, depth: usize) {
    let indent = "  ".repeat(depth);
    for (name, stat) in stats {
        match stat {
            Statistic::Number(n) if n.fract() == 0.0 => println!("{indent}{name}: {n:.0}"),
            Statistic::Number(n) => println!("{indent}{name}: {n:.2}"),
            Statistic::Group(group) => {
                println!("{indent}{name}:");
                print_statistics(group, depth + 1);
            }
        }
    }
}
