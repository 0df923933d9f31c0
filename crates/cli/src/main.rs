//! FormAgent CLI: the main entry point.
//!
//! Commands:
//! - `process`    Extract fields and detect the type of one or more forms
//! - `ask`        Ask a question about a form (several forms: cross-form analysis)
//! - `summarize`  Summarize forms
//! - `analyze`    Answer a question across several forms
//! - `compare`    Compare two forms
//! - `workflow`   Let the model pick the operation for a free-form task
//! - `status`     Show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "formagent",
    about = "FormAgent: understand any form with an LLM",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the configured model
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override the configured provider (anthropic, openai, openrouter, ollama, ...)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Overall time limit for each model call in seconds, retries included
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    deadline: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields and detect the form type
    Process {
        /// Form files to process
        #[arg(required = true)]
        files: Vec<String>,

        /// Write the processed documents as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask a question about one form, or across several
    Ask {
        /// Form files
        #[arg(short, long, required = true, num_args = 1..)]
        files: Vec<String>,

        /// The question
        #[arg(short, long)]
        question: String,
    },

    /// Summarize forms
    Summarize {
        /// Form files to summarize
        #[arg(required = true)]
        files: Vec<String>,

        /// Summary style: concise or detailed
        #[arg(short, long, default_value = "detailed")]
        style: String,

        /// Write a Markdown report per form into this directory
        #[arg(short, long)]
        report_dir: Option<PathBuf>,
    },

    /// Answer a question across several forms
    Analyze {
        /// Form files
        #[arg(short, long, required = true, num_args = 1..)]
        files: Vec<String>,

        /// The question
        #[arg(short, long)]
        question: String,
    },

    /// Compare two forms
    Compare {
        first: String,
        second: String,
    },

    /// Let the model pick the operation for a free-form task
    Workflow {
        /// What to do, in plain words
        #[arg(short, long)]
        task: String,

        /// Form files
        #[arg(short, long, required = true, num_args = 1..)]
        files: Vec<String>,

        /// A specific question to ask, if the task is one
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries results.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let overrides = commands::Overrides {
        provider: cli.provider,
        model: cli.model,
        deadline_secs: cli.deadline,
    };

    let outcome = match cli.command {
        Commands::Process { files, output } => {
            commands::process::run(&overrides, &files, output.as_deref()).await
        }
        Commands::Ask { files, question } => {
            commands::ask::run(&overrides, &files, &question).await
        }
        Commands::Summarize {
            files,
            style,
            report_dir,
        } => commands::summarize::run(&overrides, &files, &style, report_dir.as_deref()).await,
        Commands::Analyze { files, question } => {
            commands::analyze::run(&overrides, &files, &question).await
        }
        Commands::Compare { first, second } => {
            commands::compare::run(&overrides, &first, &second).await
        }
        Commands::Workflow {
            task,
            files,
            question,
        } => commands::workflow::run(&overrides, &task, &files, question.as_deref()).await,
        Commands::Status => commands::status::run(&overrides),
    };

    if let Err(e) = outcome {
        eprintln!("error[{}]: {e}", e.kind());
        std::process::exit(1);
    }
}
