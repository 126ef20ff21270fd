use analytics::{OutlierReport, RatioConfig, RollingRatioEngine};
use anyhow::{Context, Result, bail};
use api_client::{PriceHistoryProvider, YahooClient};
use clap::{Args, Parser, Subcommand};
use configuration::{AnalysisOverrides, Config, LoggingSettings};
use core_types::{RatioKind, ReturnSeries, TimeSeries};
use diagnostics::{AutocorrelationReport, NormalityReport, SeasonalDecomposition, UnitRootReport};
use indicatif::{ProgressBar, ProgressStyle};
use presentation::{ConsoleSink, JsonSink, RatioSink, SvgChartSink, chart, report};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// The main entry point for the ratiolens application.
#[tokio::main]
async fn main() -> Result<()> {
    // The .env file is optional; real environment variables work the same way.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = configuration::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::Ratio(args) => handle_ratio(config, args).await,
        Commands::Decompose(args) => handle_decompose(config, args).await,
        Commands::Normality(args) => handle_normality(config, args).await,
        Commands::Autocorrelation(args) => handle_autocorrelation(config, args).await,
        Commands::UnitRoot(args) => handle_unit_root(config, args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Rolling risk ratios and statistical diagnostics for daily stock prices.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file [default: ./ratiolens.toml when present].
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rolling Sharpe, Sortino, Treynor or Alpha with IQR outlier detection.
    Ratio(RatioArgs),
    /// Multiplicative seasonal decomposition of the closing price.
    Decompose(DecomposeArgs),
    /// Normality tests on daily log returns.
    Normality(DiagnosticArgs),
    /// Ljung-Box and Durbin-Watson tests on daily log returns.
    Autocorrelation(AutocorrelationArgs),
    /// ADF, Phillips-Perron and KPSS tests on daily log returns.
    UnitRoot(DiagnosticArgs),
}

#[derive(Args)]
struct RatioArgs {
    /// The stock symbol (e.g., "BBCA.JK").
    symbol: String,

    #[arg(long, value_enum, default_value_t = RatioKind::Sharpe)]
    kind: RatioKind,

    #[command(flatten)]
    overrides: AnalysisOverrides,

    /// Also render the ratio, its fences and outliers to this SVG file.
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Print the outlier report as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DecomposeArgs {
    /// The stock symbol (e.g., "BBCA.JK").
    symbol: String,

    /// Length of one seasonal cycle in trading days [default: analysis.period].
    #[arg(long)]
    period: Option<usize>,

    /// Render the four decomposition panels to this SVG file.
    #[arg(long)]
    chart: Option<PathBuf>,
}

#[derive(Args)]
struct DiagnosticArgs {
    /// The stock symbol (e.g., "BBCA.JK").
    symbol: String,

    /// p-value threshold for every conclusion [default: 0.05].
    #[arg(long)]
    significance: Option<f64>,
}

#[derive(Args)]
struct AutocorrelationArgs {
    #[command(flatten)]
    common: DiagnosticArgs,

    /// Highest Ljung-Box lag [default: 10].
    #[arg(long)]
    lags: Option<usize>,

    /// Render the normal Q-Q plot to this SVG file.
    #[arg(long)]
    qq_chart: Option<PathBuf>,
}

impl DiagnosticArgs {
    /// Folds the flag into the configuration and returns the upper-cased symbol.
    fn apply(&self, config: &mut Config) -> Result<String> {
        if let Some(significance) = self.significance {
            config.diagnostics.significance = significance;
        }
        config.validate()?;
        Ok(self.symbol.to_uppercase())
    }
}

impl RatioArgs {
    /// Folds the flags into the configuration and returns the upper-cased symbol.
    /// The benchmark is upper-cased too, wherever it was configured.
    fn apply(&self, config: &mut Config) -> Result<String> {
        self.overrides.apply(&mut config.analysis);
        config.analysis.benchmark = config.analysis.benchmark.to_uppercase();
        config.validate()?;
        Ok(self.symbol.to_uppercase())
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_ratio(mut config: Config, args: RatioArgs) -> Result<()> {
    let symbol = args.apply(&mut config)?;
    let settings = &config.analysis;

    let client = YahooClient::new(&config.provider)?;
    let asset = fetch_returns(&client, &symbol).await?;
    let benchmark = if args.kind.requires_benchmark() {
        Some(fetch_returns(&client, &settings.benchmark).await?)
    } else {
        None
    };

    let ratio_config = RatioConfig::new(
        args.kind,
        settings.window,
        settings.risk_free_rate,
        settings.period,
    )
    .with_beta_source(settings.beta_source)
    .with_fill_before_report(settings.fill_before_report);

    let series = RollingRatioEngine::new()
        .compute(&asset, benchmark.as_ref(), &ratio_config)
        .with_context(|| format!("Failed to compute the {} for {symbol}", args.kind))?;
    let Some(report) = OutlierReport::build(&series) else {
        bail!("The {} for {symbol} is undefined at every point", args.kind);
    };

    let mut sinks: Vec<Box<dyn RatioSink>> = Vec::new();
    if args.json {
        sinks.push(Box::new(JsonSink::stdout()));
    } else {
        sinks.push(Box::new(ConsoleSink::stdout()));
    }
    if let Some(path) = &args.chart {
        sinks.push(Box::new(SvgChartSink::new(path)));
    }

    let title = format!("Rolling {} for {symbol}", args.kind.label());
    for sink in &mut sinks {
        sink.present(&title, &series, &report)?;
    }
    Ok(())
}

async fn handle_decompose(config: Config, args: DecomposeArgs) -> Result<()> {
    let symbol = args.symbol.to_uppercase();
    let period = args.period.unwrap_or(config.analysis.period as usize);

    let client = YahooClient::new(&config.provider)?;
    let prices = fetch_prices(&client, &symbol).await?;
    let decomposition = SeasonalDecomposition::multiplicative(&prices, period)
        .with_context(|| format!("Failed to decompose {symbol}"))?;

    print!("{}", report::decomposition(&symbol, &decomposition));
    if let Some(path) = &args.chart {
        let title = format!("Seasonal Decomposition of {symbol} with {period}-day Period");
        write_svg(path, &chart::decomposition_chart(&title, &decomposition)?)?;
    }
    Ok(())
}

async fn handle_normality(mut config: Config, args: DiagnosticArgs) -> Result<()> {
    let symbol = args.apply(&mut config)?;
    let client = YahooClient::new(&config.provider)?;
    let returns = fetch_returns(&client, &symbol).await?;

    let result = NormalityReport::from_sample(&returns.values())
        .with_context(|| format!("Normality tests failed for {symbol}"))?;
    print!(
        "{}",
        report::normality(&symbol, &result, config.diagnostics.significance)
    );
    Ok(())
}

async fn handle_autocorrelation(mut config: Config, args: AutocorrelationArgs) -> Result<()> {
    if let Some(lags) = args.lags {
        config.diagnostics.ljung_box_lags = lags;
    }
    let symbol = args.common.apply(&mut config)?;
    let client = YahooClient::new(&config.provider)?;
    let returns = fetch_returns(&client, &symbol).await?;

    let result =
        AutocorrelationReport::from_sample(&returns.values(), config.diagnostics.ljung_box_lags)
            .with_context(|| format!("Autocorrelation tests failed for {symbol}"))?;
    print!(
        "{}",
        report::autocorrelation(&symbol, &result, config.diagnostics.significance)
    );
    if let Some(path) = &args.qq_chart {
        let title = format!("Normal Q-Q Plot of {symbol} Log Returns");
        write_svg(path, &chart::qq_chart(&title, &result.qq_plot)?)?;
    }
    Ok(())
}

async fn handle_unit_root(mut config: Config, args: DiagnosticArgs) -> Result<()> {
    let symbol = args.apply(&mut config)?;
    let client = YahooClient::new(&config.provider)?;
    let returns = fetch_returns(&client, &symbol).await?;

    let result = UnitRootReport::from_sample(&returns.values())
        .with_context(|| format!("Unit root tests failed for {symbol}"))?;
    print!(
        "{}",
        report::unit_root(&symbol, &result, config.diagnostics.significance)
    );
    Ok(())
}

// ==============================================================================
// Pipeline Helpers
// ==============================================================================

/// Downloads closing prices behind a spinner and plugs the gaps.
async fn fetch_prices(provider: &dyn PriceHistoryProvider, symbol: &str) -> Result<TimeSeries> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Downloading {symbol}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let history = provider.fetch_close_prices(symbol).await;
    spinner.finish_and_clear();
    let history = history.with_context(|| format!("Failed to download prices for {symbol}"))?;

    history
        .fill_gaps()
        .with_context(|| format!("No closing prices available for {symbol}"))
}

async fn fetch_returns(provider: &dyn PriceHistoryProvider, symbol: &str) -> Result<ReturnSeries> {
    let returns = fetch_prices(provider, symbol)
        .await?
        .log_returns()
        .with_context(|| format!("Failed to compute log returns for {symbol}"))?;
    tracing::debug!(symbol, returns = returns.len(), "Computed log returns.");
    Ok(returns)
}

fn write_svg(path: &Path, svg: &str) -> Result<()> {
    std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote chart.");
    Ok(())
}

/// Console logging filtered by `RUST_LOG` (falling back to the configured
/// level), plus a daily-rolling file when a log directory is configured.
/// The returned guard must live until exit so buffered file lines are flushed.
fn init_tracing(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .context("Invalid log filter")?;
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file, guard) = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &settings.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ratio_flags_parse() {
        let cli = Cli::try_parse_from([
            "ratiolens",
            "ratio",
            "bbca.jk",
            "--kind",
            "treynor",
            "--window",
            "63",
            "--beta-source",
            "raw",
            "--no-fill",
            "--chart",
            "treynor.svg",
        ])
        .unwrap();

        let Commands::Ratio(args) = cli.command else {
            panic!("expected the ratio command");
        };
        assert_eq!(args.symbol, "bbca.jk");
        assert_eq!(args.kind, RatioKind::Treynor);
        assert_eq!(args.overrides.window, Some(63));
        assert!(args.overrides.no_fill);
        assert_eq!(args.chart, Some(PathBuf::from("treynor.svg")));
        assert!(!args.json);
    }

    #[test]
    fn ratio_kind_defaults_to_sharpe() {
        let cli = Cli::try_parse_from(["ratiolens", "ratio", "BBCA.JK"]).unwrap();
        let Commands::Ratio(args) = cli.command else {
            panic!("expected the ratio command");
        };
        assert_eq!(args.kind, RatioKind::Sharpe);
    }

    #[test]
    fn configured_benchmark_is_upper_cased() {
        let cli =
            Cli::try_parse_from(["ratiolens", "ratio", "bbca.jk", "--kind", "alpha"]).unwrap();
        let Commands::Ratio(args) = cli.command else {
            panic!("expected the ratio command");
        };
        let mut config = Config::default();
        config.analysis.benchmark = "^jkse".to_string();

        assert_eq!(args.apply(&mut config).unwrap(), "BBCA.JK");
        assert_eq!(config.analysis.benchmark, "^JKSE");
    }

    #[test]
    fn global_config_flag_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "ratiolens",
            "unit-root",
            "BBCA.JK",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::UnitRoot(_)));
    }

    #[test]
    fn significance_flag_is_validated() {
        let args = DiagnosticArgs {
            symbol: "bbca.jk".to_string(),
            significance: Some(1.5),
        };
        assert!(args.apply(&mut Config::default()).is_err());

        let args = DiagnosticArgs {
            symbol: "bbca.jk".to_string(),
            significance: Some(0.01),
        };
        let mut config = Config::default();
        assert_eq!(args.apply(&mut config).unwrap(), "BBCA.JK");
        assert_eq!(config.diagnostics.significance, 0.01);
    }
}
