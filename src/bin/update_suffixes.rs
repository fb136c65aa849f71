//! Refresh the bundled public suffix list from publicsuffix.org

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;

use domainerator::suffix;

const PUBLIC_SUFFIX_URL: &str = "https://publicsuffix.org/list/public_suffix_list.dat";
const PRIVATE_SECTION_MARKER: &str = "===BEGIN PRIVATE DOMAINS===";

/// Download the public suffix list and rewrite the bundled data file
#[derive(Parser, Debug)]
#[command(name = "update-suffixes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Where to write the list
    #[arg(default_value = "data/public_suffix_list.dat")]
    output: PathBuf,

    /// Source URL
    #[arg(long, default_value = PUBLIC_SUFFIX_URL)]
    url: String,

    /// Read a local copy of the list instead of downloading it
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Keep only top level domains (suffixes without a dot)
    #[arg(long)]
    tlds_only: bool,

    /// Drop the private domains section (e.g. de.com, blogspot.com)
    #[arg(long)]
    icann_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    domainerator::init()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .with_target(false)
        .init();

    let args = Args::parse();

    let (source, body) = match &args.file {
        Some(path) => {
            let source = path.display().to_string();
            tracing::info!(path = %source, "Reading public suffix list");
            let body = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", source))?;
            (source, body)
        }
        None => {
            tracing::info!(url = %args.url, "Downloading public suffix list");
            let body = suffix::download_suffix_list(&args.url, Duration::from_secs(30))
                .await
                .with_context(|| format!("downloading {}", args.url))?;
            (args.url.clone(), body)
        }
    };

    let rules = select_rules(&body, !args.icann_only, args.tlds_only);
    if rules.is_empty() {
        bail!("no suffix rules found in {}", source);
    }
    let longest = rules.iter().map(|r| r.chars().count()).max().unwrap_or(0);

    let mut content = format!(
        "// Public Suffix List bundled with domainerator.\n\
         // License: MPL-2.0 (https://mozilla.org/MPL/2.0/)\n\
         // Source: {}\n\
         // Updated: {}\n\n",
        source,
        Utc::now().to_rfc3339()
    );
    for rule in &rules {
        content.push_str(rule);
        content.push('\n');
    }

    tokio::fs::write(&args.output, content)
        .await
        .with_context(|| format!("writing {}", args.output.display()))?;

    let known = suffix::parse_suffix_list(&tokio::fs::read_to_string(&args.output).await?);
    tracing::info!(
        path = %args.output.display(),
        rules = rules.len(),
        suffixes = known.len(),
        longest,
        "Public suffix list updated"
    );
    Ok(())
}

/// Raw rule lines kept from the downloaded list
fn select_rules(body: &str, include_private: bool, tlds_only: bool) -> Vec<String> {
    let mut rules = Vec::new();
    for line in body.lines() {
        if !include_private && line.contains(PRIVATE_SECTION_MARKER) {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let Some(rule) = line.split_whitespace().next() else {
            continue;
        };
        if tlds_only && suffix::parse_suffix_line(rule).map_or(true, |s| s.contains('.')) {
            continue;
        }
        rules.push(rule.to_string());
    }
    rules
}
