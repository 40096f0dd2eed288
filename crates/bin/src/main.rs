//! Hobart CLI binary.
//!
//! Runs market-model event studies over wide price tables.

use clap::{Parser, Subcommand};
use hobart::market::{MarketMap, MarketResolver};
use hobart::output::{ExportFormat, StudyReport};
use hobart::{
    BatchObserver, BatchOptions, BatchReport, EntityResult, StudyConfig, StudyContext,
    StudyInputs,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: market-model abnormal returns for event studies", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at info level unless RUST_LOG is set
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate market models and write abnormal returns
    Run {
        /// Study configuration (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Wide entity price table (CSV)
        #[arg(long)]
        entities: PathBuf,

        /// Wide index price table (CSV)
        #[arg(long)]
        indices: PathBuf,

        /// Entity characteristics (CSV)
        #[arg(long)]
        characteristics: PathBuf,

        /// Country/exchange to index map (JSON)
        #[arg(long)]
        market_map: PathBuf,

        /// Directory receiving the output tables
        #[arg(long, default_value = "hobart-output")]
        output_dir: PathBuf,

        /// Output format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Process entities one at a time
        #[arg(long)]
        sequential: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Resolve the reference index for a country and exchange
    Resolve {
        /// Country/exchange to index map (JSON)
        #[arg(long)]
        market_map: PathBuf,

        /// Country of domicile code
        #[arg(long)]
        country: Option<String>,

        /// Listing exchange code
        #[arg(long)]
        exchange: Option<String>,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check a study configuration without running it
    Validate {
        /// Study configuration (JSON)
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Run {
            config,
            entities,
            indices,
            characteristics,
            market_map,
            output_dir,
            format,
            sequential,
            no_progress,
        } => {
            let inputs = StudyInputs {
                entities,
                indices,
                characteristics,
                market_map,
            };
            let format: ExportFormat = format.parse()?;
            run_study(&config, &inputs, &output_dir, format, sequential, no_progress)?;
        }
        Commands::Resolve {
            market_map,
            country,
            exchange,
            format,
        } => {
            resolve_index(&market_map, country.as_deref(), exchange.as_deref(), &format)?;
        }
        Commands::Validate { config } => {
            validate_config(&config)?;
        }
    }

    Ok(())
}

/// Drives an indicatif bar from batch callbacks.
#[derive(Debug)]
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new(hidden: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("█▓░"),
        );
        Ok(Self { bar })
    }
}

impl BatchObserver for ProgressObserver {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(Duration::from_millis(100));
        self.bar.set_message("Estimating market models...");
    }

    fn on_outcome(&self, entity_id: &str, _result: &EntityResult) {
        self.bar.set_message(entity_id.to_string());
        self.bar.inc(1);
    }

    fn on_finish(&self, report: &BatchReport) {
        self.bar.finish_with_message(format!(
            "{} fitted, {} skipped",
            report.fits.len(),
            report.skips.len()
        ));
    }
}

fn run_study(
    config_path: &std::path::Path,
    inputs: &StudyInputs,
    output_dir: &std::path::Path,
    format: ExportFormat,
    sequential: bool,
    no_progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = StudyConfig::from_file(config_path)?.validate()?;
    let parallel = settings.parallel && !sequential;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", "MARKET MODEL EVENT STUDY");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!(
        "Estimation window: ({}, {})",
        settings.window.start, settings.window.end
    );
    println!("Return variable:   {}", settings.return_kind);
    println!("Covariance:        {}", settings.model.covariance);
    println!();

    print!("Loading inputs...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let ctx = match StudyContext::load(settings, inputs) {
        Ok(ctx) => {
            println!(
                " ✓ ({} entities, {} indices)",
                ctx.entities().len(),
                ctx.indices().len()
            );
            ctx
        }
        Err(e) => {
            println!(" ✗");
            return Err(e.into());
        }
    };

    let interrupt = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupt);
    ctrlc::set_handler(move || {
        // In-flight entities finish; no new ones start
        handler_flag.store(true, Ordering::Relaxed);
    })?;

    let observer = ProgressObserver::new(no_progress)?;
    let options = batch_options(parallel, interrupt);
    let report = hobart::run_batch(&ctx, &options, &observer);
    let summary = report.summary(&ctx);
    if !summary.is_complete() {
        warn!(
            not_dispatched = summary.not_dispatched,
            "interrupted, writing partial results"
        );
    }

    let fits = report.fit_exports();
    let paths = StudyReport {
        abnormal_returns: &report.records,
        fits: &fits,
        skips: &report.skips,
        summary: &summary,
    }
    .write(output_dir, format)?;
    info!(dir = %output_dir.display(), "report written");

    println!();
    println!("{}", summary.to_ascii_table());
    println!("Abnormal returns:  {}", paths.abnormal_returns.display());
    println!("Cumulative:        {}", paths.cumulative.display());
    println!("Fits:              {}", paths.fits.display());
    println!("Skipped:           {}", paths.skips.display());
    println!("Summary:           {}", paths.summary.display());

    if !summary.is_complete() {
        return Err(format!(
            "interrupted: {} of {} entities not processed",
            summary.not_dispatched, summary.entities_total
        )
        .into());
    }

    Ok(())
}

fn batch_options(parallel: bool, interrupt: Arc<AtomicBool>) -> BatchOptions {
    BatchOptions {
        parallel,
        ..Default::default()
    }
    .with_interrupt(interrupt)
}

fn resolve_index(
    market_map: &std::path::Path,
    country: Option<&str>,
    exchange: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let map = MarketMap::from_json_file(market_map)?;
    let result = MarketResolver::new(&map).resolve(country, exchange);
    let (countries, exchanges) = map.table_sizes();

    match format {
        "json" => {
            let value = match &result {
                Ok(resolution) => json!({
                    "country": country,
                    "exchange": exchange,
                    "index": resolution.index,
                    "via": resolution.via,
                    "known_indices": map.index_names(),
                }),
                Err(e) => json!({
                    "country": country,
                    "exchange": exchange,
                    "index": null,
                    "skip_reason": "MissingIndexMapping",
                    "detail": e.to_string(),
                    "known_indices": map.index_names(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        "text" => {
            println!(
                "Market map: {} countries, {} exchanges, {} indices",
                countries,
                exchanges,
                map.index_names().len()
            );
            match &result {
                Ok(resolution) => {
                    println!("Index: {} (via {})", resolution.index, resolution.via);
                }
                Err(e) => {
                    println!("Unresolved: {}", e);
                    println!("Entity would be skipped with MissingIndexMapping");
                    println!("Known indices: {}", map.index_names().join(", "));
                }
            }
        }
        other => return Err(format!("Unknown format {:?}, expected json or text", other).into()),
    }

    Ok(())
}

fn validate_config(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let settings = StudyConfig::from_file(path)?.validate()?;

    println!("Configuration OK");
    println!(
        "  Estimation window: ({}, {})",
        settings.window.start, settings.window.end
    );
    println!("  Prediction from:   {}", settings.window.end);
    println!("  Anchor excluded:   {}", settings.anchor);
    println!("  Return variable:   {}", settings.return_kind);
    println!(
        "  Labels:            entity {:?}, index {:?}",
        settings.entity_transform.price_label, settings.index_transform.price_label
    );
    println!("  Covariance:        {}", settings.model.covariance);
    println!("  Min observations:  {}", settings.model.min_observations);
    println!("  Parallel:          {}", settings.parallel);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_options_carry_interrupt() {
        let interrupt = Arc::new(AtomicBool::new(false));
        let options = batch_options(false, Arc::clone(&interrupt));
        assert!(!options.parallel);
        assert!(!options.interrupted());

        interrupt.store(true, Ordering::Relaxed);
        assert!(options.interrupted());
    }
}
