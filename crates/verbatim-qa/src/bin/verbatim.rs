//! Verbatim command-line interface
//!
//! Build the index and/or ask a question:
//!
//! ```text
//! verbatim --build
//! verbatim "What is the repo rate?"
//! verbatim --build --docs ./pdfs --db ./index.db -k 8 "Who issues currency?"
//! ```

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use verbatim_qa::{ask, build_index, format_answer, FormatOptions, VerbatimConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "verbatim", version, about = "Ask questions answered verbatim from your PDFs")]
struct Args {
    /// Build (or rebuild) the index from the documents folder
    #[arg(long)]
    build: bool,

    /// Documents folder (default: $DOCS_DIR or <base>/doc)
    #[arg(long, value_name = "PATH")]
    docs: Option<PathBuf>,

    /// Index file (default: $DB_PATH or <base>/index.db)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE", env = "VERBATIM_CONFIG")]
    config: Option<PathBuf>,

    /// Passages retrieved per question
    #[arg(short = 'k', long = "top-k")]
    top_k: Option<usize>,

    /// Ollama model used for span extraction
    #[arg(long, value_name = "MODEL")]
    extractor: Option<String>,

    /// Question to ask (words are joined with spaces)
    question: Vec<String>,
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verbatim_qa=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = VerbatimConfig::load(args.config.as_deref())?;
    if let Some(docs) = args.docs {
        config.paths.docs_dir = docs;
    }
    if let Some(db) = args.db {
        config.paths.db_path = db;
    }
    if let Some(model) = args.extractor {
        config.extractor.model = Some(model);
    }
    let top_k = args.top_k.unwrap_or(config.query.top_k);

    let question = args.question.join(" ");
    if !args.build && args.question.is_empty() {
        tracing::debug!("Neither --build nor a question given; nothing to do");
        return Ok(());
    }

    if args.build {
        let docs_dir = config.paths.docs_dir.clone();
        let db_path = config.paths.db_path.clone();
        let index_config = config.index.clone();

        // indicatif hides the spinner when stderr is not a terminal
        let bar = spinner(format!("Building index from {}", docs_dir.display()));
        let built = tokio::task::spawn_blocking(move || {
            build_index(&docs_dir, &db_path, &index_config)
        })
        .await
        .context("Index build task panicked")?;
        bar.finish_and_clear();

        let path = built?;
        println!("{} {}", style("Index ready at:").green().bold(), path.display());
    }

    if !args.question.is_empty() {
        let response = ask(&question, &config.paths.db_path, top_k, &config).await?;
        println!(
            "{}",
            format_answer(Some(&response), FormatOptions::from(&config.answer))
        );
    }

    Ok(())
}
