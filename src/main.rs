//! Domainerator - generate domain names from word lists and find the free ones

use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::BufWriter;
use tokio_util::sync::CancellationToken;

use domainerator::{
    cli::Cli, suffix, wordlist, DnsChecker, DomainGenerator, DomaineratorError, Pipeline, Progress,
    Result, RunSummary, WordListKind,
};

#[tokio::main]
async fn main() {
    // Load .env before clap reads DOMAINERATOR_* variables
    if let Err(e) = domainerator::init() {
        eprintln!("❌ Failed to initialize: {}", e);
        process::exit(1);
    }

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(summary) => {
            print_summary(&summary);
            if summary.interrupted {
                DomaineratorError::Interrupted.exit_code()
            } else {
                0
            }
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            e.exit_code()
        }
    };

    process::exit(code);
}

async fn run(cli: Cli) -> Result<RunSummary> {
    let quiet = cli.quiet;
    let config = cli.into_config()?;
    let input = &config.input;

    let filter = input
        .word_filter
        .as_deref()
        .map(wordlist::compile_filter)
        .transpose()?;
    let prefixes = wordlist::load_required(&input.prefixes, WordListKind::Prefixes, filter.as_ref())?;
    let suffixes = wordlist::load_required(&input.suffixes, WordListKind::Suffixes, filter.as_ref())?;

    let public_suffixes = suffix::parse_public_suffix_csv(
        &input.public_suffixes,
        suffix::known_suffixes(),
        input.include_tlds,
    )?;

    let generator = DomainGenerator::new(public_suffixes, config.generate.clone());
    let domains = generator.generate(&prefixes, &suffixes)?;
    let checker = Arc::new(DnsChecker::new(config.check.clone())?);

    let file = tokio::fs::File::create(&input.output).await.map_err(|e| {
        DomaineratorError::output_create(input.output.to_string_lossy(), e.to_string())
    })?;
    let mut sink = BufWriter::new(file);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing queries in flight");
            on_signal.cancel();
        }
    });

    let bar = progress_bar(domains.len() as u64, quiet);
    let pipeline = Pipeline::new(checker, config.pipeline.clone()).with_cancellation(cancel);
    let summary = pipeline
        .run(domains, &mut sink, |progress| update_bar(&bar, progress))
        .await;

    bar.finish_and_clear();
    summary
}

fn progress_bar(total: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn update_bar(bar: &ProgressBar, progress: &Progress) {
    bar.set_position(progress.processed);
    let remaining = progress
        .estimated_remaining
        .map(|d| format!(", ~{}s left", d.as_secs()))
        .unwrap_or_default();
    bar.set_message(format!(
        "{} available, {} failed{}",
        progress.available, progress.failed, remaining
    ));
}

fn print_summary(summary: &RunSummary) {
    let status = if summary.interrupted { "⚡ Interrupted" } else { "✅ Done" };
    eprintln!(
        "{}: {}/{} checked, {} available, {} failed, {} retries, {} written in {:.1}s (started {})",
        status,
        summary.processed,
        summary.total,
        summary.available,
        summary.failed,
        summary.retried,
        summary.written,
        summary.elapsed.as_secs_f64(),
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}
