use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use trend_scout::analyzer::ChapterScope;
use trend_scout::config::{AppConfig, ConfigError, Quarter, load_config};
use trend_scout::fetcher::{CachedSource, CensusFetcher, FetchProgress};
use trend_scout::model::{ExportError, FetchError};
use trend_scout::pipeline::{AnalysisOutcome, AnalysisSettings, PipelineError, run_analysis};
use trend_scout::report::{export_to_path, outcome_message, render_report};
use trend_scout::storage::SqliteStorage;

const DEFAULT_CONFIG: &str = "config.json";

#[derive(Parser, Debug)]
#[command(name = "trend-scout", version, about = "Finds the fastest growing import categories year over year")]
struct Args {
    /// Path to the JSON config; defaults apply when the default file is absent
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Year to analyze; compared against the year before
    #[arg(short, long)]
    year: Option<i32>,

    #[arg(short, long, value_enum, ignore_case = true)]
    quarter: Option<Quarter>,

    /// Chapter prefix such as 84, or ALL
    #[arg(long)]
    chapter: Option<String>,

    /// Lower edge of the standard volume band, in millions
    #[arg(long)]
    min_volume: Option<f64>,

    /// Upper edge of the standard volume band, in millions
    #[arg(long)]
    max_volume: Option<f64>,

    /// Also surface low-volume, high-growth categories
    #[arg(long, conflicts_with = "no_gems")]
    gems: bool,

    /// Turn gem mode off even when the config enables it
    #[arg(long)]
    no_gems: bool,

    /// Minimum growth in percent for a gem
    #[arg(long)]
    gem_threshold: Option<f64>,

    /// Number of ranked rows to show
    #[arg(long)]
    top: Option<usize>,

    /// Write the ranked rows to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Ignore the month cache
    #[arg(long, conflicts_with = "clear_cache")]
    no_cache: bool,

    /// Empty the month cache before fetching
    #[arg(long)]
    clear_cache: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

#[tokio::main]
async fn main() {
    init_tracing();

    // Log any panic before the process goes down
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {}", panic_info);
    }));

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn resolve_config(args: &Args) -> Result<AppConfig, ConfigError> {
    let mut config = if !args.config.exists() && args.config == Path::new(DEFAULT_CONFIG) {
        info!("No {} found, using built-in defaults", DEFAULT_CONFIG);
        AppConfig::default()
    } else {
        load_config(&args.config)?
    };

    let analysis = &mut config.analysis;
    if let Some(year) = args.year {
        analysis.year = Some(year);
    }
    if let Some(quarter) = args.quarter {
        analysis.quarter = quarter;
    }
    if let Some(chapter) = &args.chapter {
        analysis.chapter = chapter.clone();
    }
    if let Some(min) = args.min_volume {
        analysis.min_volume_millions = min;
    }
    if args.max_volume.is_some() {
        analysis.max_volume_millions = args.max_volume;
    }
    if args.gems {
        analysis.gem_mode = true;
    }
    if args.no_gems {
        analysis.gem_mode = false;
    }
    if let Some(threshold) = args.gem_threshold {
        analysis.gem_growth_threshold = threshold;
    }
    if let Some(top) = args.top {
        analysis.top_n = top;
    }
    if let Some(path) = &args.export {
        config.export_path = Some(path.to_string_lossy().into_owned());
    }
    if args.no_cache {
        config.cache_path = None;
    }

    config.validate()?;
    Ok(config)
}

fn open_cache(path: Option<&str>, clear: bool) -> Option<SqliteStorage> {
    let path = path?;
    let storage = match SqliteStorage::new(path) {
        Ok(storage) => storage,
        Err(e) => {
            warn!("Cache unavailable, fetching without it: {}", e);
            return None;
        }
    };

    if clear {
        match storage.clear() {
            Ok(removed) => info!("Cleared {} cached months from {}", removed, path),
            Err(e) => warn!("Failed to clear cache at {}: {}", path, e),
        }
    }
    match storage.cached_months() {
        Ok(months) => info!("Using month cache at {} ({} months cached)", path, months.len()),
        Err(e) => warn!("Cache at {} could not be listed: {}", path, e),
    }
    Some(storage)
}

fn report_title(config: &AppConfig, settings: &AnalysisSettings) -> String {
    let mut title = format!(
        "Top {} fastest growing imports, {} {} vs {}",
        settings.top_n,
        config.analysis.quarter.label(),
        settings.year,
        settings.prior_year()
    );
    if let ChapterScope::Chapter(chapter) = &settings.chapter {
        title.push_str(&format!(", chapter {}", chapter));
    }
    title
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = resolve_config(&args)?;
    let settings = AnalysisSettings::from_config(&config);
    info!(
        "Analyzing {} {} against {}",
        config.analysis.quarter.label(),
        settings.year,
        settings.prior_year()
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<FetchProgress>();
    let progress_task = tokio::spawn(async move {
        while let Some(p) = rx.recv().await {
            info!(
                "Fetching data for {}... {}/{} ({:.0}%)",
                p.year,
                p.completed,
                p.total,
                p.fraction() * 100.0
            );
        }
    });

    let fetcher = CensusFetcher::new(&config.source)?;
    let commodity_level = fetcher.commodity_level().to_string();

    let outcome = match open_cache(config.cache_path.as_deref(), args.clear_cache) {
        Some(storage) => {
            let source = CachedSource::new(fetcher, Arc::new(Mutex::new(storage)), &commodity_level);
            run_analysis(&source, &settings, Some(tx)).await?
        }
        None => run_analysis(&fetcher, &settings, Some(tx)).await?,
    };
    let _ = progress_task.await;

    match &outcome {
        AnalysisOutcome::Ranked(report) => {
            println!("{}", render_report(report, &report_title(&config, &settings)));
            if let Some(path) = &config.export_path {
                export_to_path(Path::new(path), &report.rows)?;
                info!("Exported {} rows to {}", report.rows.len(), path);
            }
        }
        other => {
            let message = outcome_message(other, &settings);
            if other.is_no_data() {
                warn!("{}", message);
            }
            println!("{}", message);
        }
    }

    Ok(())
}
