//! `formagent compare`: Compare two forms.

use super::analyze::print_analysis;
use super::{Overrides, build_agent, print_usage};
use formagent_core::error::Result;

pub async fn run(overrides: &Overrides, first: &str, second: &str) -> Result<()> {
    let agent = build_agent(overrides)?;

    eprintln!("  Processing {first}...");
    let a = agent.process_form(first).await?;
    eprintln!("  Processing {second}...");
    let b = agent.process_form(second).await?;

    let result = agent.compare(&a, &b).await?;
    println!(
        "\n⚖️  {} ({}) vs {} ({})",
        a.source(),
        a.form_type_label(),
        b.source(),
        b.form_type_label()
    );
    print_analysis(&result);

    print_usage(&agent);
    Ok(())
}
