//! `formagent status`: Show the effective configuration.

use super::{Overrides, load_config};
use formagent_config::AppConfig;
use formagent_core::error::Result;

pub fn run(overrides: &Overrides) -> Result<()> {
    let config = load_config(overrides)?;

    println!("📋 FormAgent Status");
    println!("==================");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Provider:      {}", config.provider);
    println!("  Model:         {}", config.model);
    if let Some(ref url) = config.api_url {
        println!("  API URL:       {url}");
    }
    println!(
        "  API key:       {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );
    println!("  Timeout:       {}s", config.client.timeout_secs);
    match config.client.deadline_secs {
        Some(secs) => println!("  Deadline:      {secs}s per call"),
        None => println!("  Deadline:      none"),
    }
    println!(
        "  Retries:       {} (backoff {}ms..{}ms)",
        config.client.max_retries, config.client.backoff_base_ms, config.client.backoff_max_ms
    );
    println!("  Max tokens:    {}", config.client.max_tokens);
    println!("  Temperature:   {}", config.client.temperature);
    println!("  Prompt budget: {} chars", config.prompt.max_prompt_chars);
    println!(
        "  Confidence:    {}",
        if config.parser.strict_confidence { "strict" } else { "clamped" }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, using defaults. Example:\n");
        println!("{}", AppConfig::default_toml());
    }

    Ok(())
}
