//! bizlookup - Belgian company lookup CLI
//!
//! Thin shell over `bizlookup_core`: every command maps onto one core
//! operation and renders its result as text or JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use bizlookup_core::{
    classify, default_log_level, init_logging, CompanyProfile, CompanySummary, HistoryEntry,
    LookupConfig, LookupContext, QueryKind, Suggestions, VatNumber,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde_json::json;

/// Extra wait on top of debounce and simulated latency before giving up on
/// suggestions.
const SUGGEST_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "bizlookup", version, about = "Look up Belgian companies by name or VAT number")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "BIZLOOKUP_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show how an input would be interpreted
    Classify { input: String },
    /// Replay successive search-bar states and print the suggestions that win
    Suggest {
        /// Search-bar contents, one per keystroke
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Pause between inputs in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },
    /// Run a search and record it in the history
    Search { query: String },
    /// Show the profile of the company with this VAT number
    Profile { vat: String },
    /// List recent searches, newest first
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Remove all search history
    ClearHistory,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if cli.json {
                let error_json = json!({ "error": true, "message": format!("{err:#}") });
                println!("{error_json}");
            } else {
                eprintln!("Error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = LookupConfig::load(cli.config.as_deref()).context("loading configuration")?;
    start_logging(&config)?;

    if let Commands::Classify { input } = &cli.command {
        return print_classification(cli.json, input);
    }

    let ctx = LookupContext::open(&config).context("opening company directory")?;
    match &cli.command {
        Commands::Classify { .. } => Ok(()),
        Commands::Suggest {
            inputs,
            interval_ms,
        } => suggest(&ctx, cli.json, inputs, Duration::from_millis(*interval_ms), &config).await,
        Commands::Search { query } => search(&ctx, cli.json, query).await,
        Commands::Profile { vat } => profile(&ctx, cli.json, vat).await,
        Commands::History { limit } => {
            let limit = limit.unwrap_or_else(|| ctx.ledger().view_size());
            let entries = ctx.ledger().recent(limit).await;
            print_history(cli.json, &entries)
        }
        Commands::ClearHistory => {
            let removed = ctx.ledger().clear().await.context("clearing history")?;
            if cli.json {
                println!("{}", json!({ "removed": removed.len() }));
            } else {
                println!("removed {} history entries", removed.len());
            }
            Ok(())
        }
    }
}

fn start_logging(config: &LookupConfig) -> Result<()> {
    let Some(dir) = config.logging.dir.as_deref() else {
        return Ok(());
    };
    let dir = absolute(dir)?;
    let level = config
        .logging
        .level
        .as_deref()
        .unwrap_or(default_log_level());
    init_logging(level, &dir).context("starting file logging")?;
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("resolving working directory")?;
    Ok(cwd.join(path))
}

fn print_classification(as_json: bool, input: &str) -> Result<()> {
    let kind = classify(input);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&kind)?);
        return Ok(());
    }
    match kind {
        QueryKind::Empty => println!("empty: nothing to look up"),
        QueryKind::VatNumber(vat) => println!("vat number: {vat}"),
        QueryKind::NamePrefix(name) => println!("name query: {name}"),
    }
    Ok(())
}

async fn suggest(
    ctx: &LookupContext,
    as_json: bool,
    inputs: &[String],
    interval: Duration,
    config: &LookupConfig,
) -> Result<()> {
    let mut fetcher = ctx.suggestion_fetcher();
    let mut rx = fetcher.subscribe();
    let mut last_kind = QueryKind::Empty;

    for (index, input) in inputs.iter().enumerate() {
        if index > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        last_kind = fetcher.on_input(input);
    }

    if let QueryKind::NamePrefix(prefix) = &last_kind {
        let deadline = fetcher.config().debounce + config.simulated_latency() + SUGGEST_GRACE;
        tokio::time::timeout(
            deadline,
            rx.wait_for(|current| current.query.as_deref() == Some(prefix.as_str())),
        )
        .await
        .context("timed out waiting for suggestions")?
        .context("suggestion fetcher stopped")?;
    }

    print_suggestions(as_json, &last_kind, &fetcher.current())
}

fn print_suggestions(as_json: bool, kind: &QueryKind, suggestions: &Suggestions) -> Result<()> {
    if as_json {
        let out = json!({ "input": kind, "suggestions": suggestions });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    match kind {
        QueryKind::VatNumber(vat) => println!("valid VAT number {vat}; press search to look it up"),
        QueryKind::Empty => println!("no suggestions"),
        QueryKind::NamePrefix(_) if suggestions.is_empty() => println!("no matching companies"),
        QueryKind::NamePrefix(_) => print_summaries(&suggestions.items),
    }
    Ok(())
}

async fn search(ctx: &LookupContext, as_json: bool, query: &str) -> Result<()> {
    match ctx.search().search(query).await {
        Ok(outcome) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if outcome.results.is_empty() {
                println!("no companies match \"{}\"", outcome.history_entry.query);
            } else {
                print_summaries(&outcome.results);
            }
            Ok(())
        }
        Err(err) if err.is_retryable() => {
            Err(anyhow::Error::new(err).context("search failed; try again"))
        }
        Err(err) => Err(err.into()),
    }
}

async fn profile(ctx: &LookupContext, as_json: bool, raw_vat: &str) -> Result<()> {
    let vat: VatNumber = raw_vat.parse()?;
    let profile = ctx
        .profiles()
        .load_by_vat(&vat)
        .await
        .context("loading company profile")?;

    if as_json {
        let metrics = profile.latest_metrics();
        let out = json!({ "profile": profile, "latest_metrics": metrics });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    print_profile(&profile);
    Ok(())
}

fn print_profile(profile: &CompanyProfile) {
    let company = &profile.company;
    println!("{} ({})", company.name, company.vat_number);
    println!("  legal form: {}", company.legal_form);
    println!("  status:     {}", company.status);
    if let Some(founded) = company.founded_date {
        println!("  founded:    {founded}");
    }
    let address = &company.address;
    println!(
        "  address:    {} {}, {} {}, {}",
        address.street, address.number, address.postal_code, address.city, address.country
    );
    for (label, value) in [
        ("email", &company.contact.email),
        ("phone", &company.contact.phone),
        ("website", &company.contact.website),
    ] {
        if let Some(value) = value {
            println!("  {label:<11} {value}");
        }
    }

    let today = Local::now().date_naive();
    let active = profile.active_executives(today);
    println!("executives ({} active):", active.len());
    for exec in &profile.executives {
        let until = exec
            .end_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "present".to_string());
        println!("  {} - {} ({} to {until})", exec.name, exec.role, exec.start_date);
    }

    let metrics = profile.latest_metrics();
    if metrics.is_empty() {
        println!("financials: none published");
        return;
    }
    println!("financials ({}):", metrics[0].year);
    for snapshot in metrics {
        let change = snapshot
            .change_pct
            .map(|pct| format!("{pct:+.1}%"))
            .unwrap_or_else(|| "n/a".to_string());
        println!("  {:<10} {:>16} {change}", snapshot.metric.label(), snapshot.value);
    }
}

fn print_summaries(items: &[CompanySummary]) {
    for item in items {
        println!("{}  {}  {}", item.vat_number, item.name, item.city);
    }
}

fn print_history(as_json: bool, entries: &[HistoryEntry]) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("no recent searches");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {:>3} results  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.result_count,
            entry.query
        );
    }
    Ok(())
}
