//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::ndjson_price_adapter::NdjsonPriceAdapter;
use crate::domain::analysis::{analyze, Analysis, AnalysisConfig};
use crate::domain::config_validation::{validate_input_config, validate_replay_config};
use crate::domain::error::ReplayError;
use crate::domain::ledger::TradeLedger;
use crate::domain::metrics::{Metrics, MetricsConfig, DEFAULT_STARTING_BALANCE};
use crate::domain::position::{ClosePolicy, DEFAULT_LOT_NOTIONAL};
use crate::domain::price::DEFAULT_CONVERSION_FX;
use crate::domain::replay::{ReplayConfig, TrailingTrades};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::price_port::PricePort;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT: &str = "valuation.csv";
const PERIOD_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Parser, Debug)]
#[command(
    name = "tradereplay",
    about = "Replay a strategy-tester trade ledger against price bars"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a ledger against a price series and write the valuation
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        ledger: Option<PathBuf>,
        #[arg(short, long)]
        prices: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print ledger metrics without price data
    Metrics {
        #[arg(short, long)]
        ledger: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Replay {
            config,
            ledger,
            prices,
            symbol,
            output,
        } => run_replay_command(
            &config,
            ledger.as_ref(),
            prices.as_ref(),
            symbol.as_deref(),
            output.as_ref(),
        ),
        Command::Metrics { ledger, config } => run_metrics_command(&ledger, config.as_ref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn build_analysis_config(adapter: &dyn ConfigPort) -> Result<AnalysisConfig, ReplayError> {
    let trailing_trades = match adapter.get_string("replay", "trailing_trades") {
        Some(s) => s
            .parse::<TrailingTrades>()
            .map_err(|reason| ReplayError::ConfigInvalid {
                section: "replay".into(),
                key: "trailing_trades".into(),
                reason,
            })?,
        None => TrailingTrades::default(),
    };

    Ok(AnalysisConfig {
        replay: ReplayConfig {
            lot_notional: adapter.get_double("replay", "lot_notional", DEFAULT_LOT_NOTIONAL),
            close_policy: ClosePolicy::FifoSingleLotClose,
            trailing_trades,
        },
        metrics: MetricsConfig {
            starting_balance: adapter.get_double(
                "metrics",
                "starting_balance",
                DEFAULT_STARTING_BALANCE,
            ),
        },
        default_conversion_fx: adapter.get_double(
            "replay",
            "default_conversion_fx",
            DEFAULT_CONVERSION_FX,
        ),
    })
}

/// Input and output locations after CLI overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPaths {
    pub ledger: PathBuf,
    pub prices: Option<PathBuf>,
    pub symbol: Option<String>,
    pub output: PathBuf,
}

pub fn resolve_paths(
    config: &FileConfigAdapter,
    ledger_override: Option<&PathBuf>,
    prices_override: Option<&PathBuf>,
    symbol_override: Option<&str>,
    output_override: Option<&PathBuf>,
) -> Result<RunPaths, ReplayError> {
    let ledger = ledger_override
        .cloned()
        .or_else(|| config.get_path("input", "ledger"))
        .ok_or_else(|| ReplayError::ConfigMissing {
            section: "input".into(),
            key: "ledger".into(),
        })?;
    let prices = prices_override
        .cloned()
        .or_else(|| config.get_path("input", "prices"));
    let symbol = symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("input", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());
    let output = output_override
        .cloned()
        .or_else(|| config.get_path("output", "path"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    Ok(RunPaths {
        ledger,
        prices,
        symbol,
        output,
    })
}

/// Load inputs through the ports and run the analysis.
///
/// A price source that fails is reported and the run continues ledger-only.
pub fn run_analysis_pipeline(
    ledger_port: &dyn LedgerPort,
    price_port: Option<&dyn PricePort>,
    symbol: Option<&str>,
    config: &AnalysisConfig,
) -> Result<Analysis, ReplayError> {
    let ledger_load = ledger_port.load_trades()?;
    if !ledger_load.skipped.is_empty() {
        warn!(
            skipped = ledger_load.skipped.len(),
            "some ledger rows could not be read"
        );
    }

    let series = match price_port.map(|port| port.fetch_bars(symbol)) {
        Some(Ok(load)) => {
            if !load.skipped.is_empty() {
                warn!(skipped = load.skipped.len(), "some price lines could not be read");
            }
            Some(load.series)
        }
        Some(Err(e)) => {
            warn!(error = %e, "price series unavailable, continuing ledger-only");
            None
        }
        None => None,
    };

    analyze(ledger_load.trades, series.as_ref(), config)
}

fn run_replay_command(
    config_path: &Path,
    ledger_override: Option<&PathBuf>,
    prices_override: Option<&PathBuf>,
    symbol_override: Option<&str>,
    output_override: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_replay_config(&adapter)
        .and_then(|_| validate_input_config(&adapter, ledger_override.is_some()))
    {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let analysis_config = match build_analysis_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: Resolve inputs
    let paths = match resolve_paths(
        &adapter,
        ledger_override,
        prices_override,
        symbol_override,
        output_override,
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Load ledger and prices, run analysis
    let ledger_port = CsvLedgerAdapter::new(paths.ledger.clone());
    let price_adapter = paths.prices.clone().map(|p| {
        NdjsonPriceAdapter::new(p).with_default_conversion_fx(analysis_config.default_conversion_fx)
    });
    info!(ledger = %paths.ledger.display(), "loading ledger");

    let analysis = match run_analysis_pipeline(
        &ledger_port,
        price_adapter.as_ref().map(|a| a as &dyn PricePort),
        paths.symbol.as_deref(),
        &analysis_config,
    ) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Console summary
    print_summary(&analysis);

    // Stage 5: Report
    let report = CsvReportAdapter::new().with_metrics(adapter.get_bool("output", "metrics", true));
    let output = paths.output.display().to_string();
    match report.write(&analysis, &output) {
        Ok(()) => {
            if analysis.is_ledger_only() {
                eprintln!(
                    "\nMetrics written to: {}",
                    CsvReportAdapter::metrics_path(&paths.output).display()
                );
            } else {
                eprintln!("\nReport written to: {}", output);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_metrics_command(ledger_path: &Path, config_path: Option<&PathBuf>) -> ExitCode {
    let adapter = match config_path {
        Some(path) => match load_config(path) {
            Ok(a) => a,
            Err(code) => return code,
        },
        None => FileConfigAdapter::empty(),
    };
    if let Err(e) = validate_replay_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let analysis_config = match build_analysis_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let ledger_port = CsvLedgerAdapter::new(ledger_path.to_path_buf());
    match run_analysis_pipeline(&ledger_port, None, None, &analysis_config) {
        Ok(analysis) => {
            print_summary(&analysis);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_replay_config(&adapter)
        .and_then(|_| validate_input_config(&adapter, false))
    {
        eprintln!("error: {e}");
        return (&e).into();
    }

    match build_analysis_config(&adapter) {
        Ok(config) => {
            eprintln!("\nReplay:");
            eprintln!("  lot_notional:          {}", config.replay.lot_notional);
            eprintln!("  default_conversion_fx: {}", config.default_conversion_fx);
            eprintln!("  trailing_trades:       {:?}", config.replay.trailing_trades);
            eprintln!("  close_policy:          {:?}", config.replay.close_policy);
            eprintln!("Metrics:");
            eprintln!("  starting_balance:      {}", config.metrics.starting_balance);
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn format_summary(metrics: &Metrics) -> Vec<String> {
    vec![
        format!("Trades:           {}", metrics.total_trades),
        format!(
            "Opens:            {} long / {} short",
            metrics.long_opens, metrics.short_opens
        ),
        format!(
            "Closed:           {} ({} take-profit, {} stop-loss)",
            metrics.closed_trades, metrics.take_profit_closes, metrics.stop_loss_closes
        ),
        format!("Win Rate:         {:.1}%", metrics.win_rate * 100.0),
        format!("Total P&L:        {:.2}", metrics.total_pnl),
        format!("Average Win:      {:.2}", metrics.avg_win),
        format!("Average Loss:     {:.2}", metrics.avg_loss),
        format!("Profit Factor:    {:.2}", metrics.profit_factor),
        format!("Max Drawdown:     -{:.2}%", metrics.max_drawdown * 100.0),
        format!("Final Balance:    {:.2}", metrics.final_balance),
    ]
}

/// Time span covered by the ledger's trades.
pub fn format_period(ledger: &TradeLedger) -> Option<String> {
    let first = ledger.first_timestamp()?;
    let last = ledger.last_timestamp()?;
    Some(format!(
        "Period:           {} .. {}",
        first.format(PERIOD_FORMAT),
        last.format(PERIOD_FORMAT)
    ))
}

fn print_summary(analysis: &Analysis) {
    eprintln!("\n=== Ledger Metrics ===");
    if let Some(period) = format_period(&analysis.ledger) {
        eprintln!("{period}");
    }
    for line in format_summary(&analysis.metrics) {
        eprintln!("{line}");
    }

    match &analysis.valuation {
        Some(valuation) => {
            eprintln!("\n=== Valuation ===");
            eprintln!("Bars:             {}", valuation.records.len());
            if valuation.dropped > 0 {
                eprintln!("Dropped Trades:   {} (after last bar)", valuation.dropped);
            }
            if let Some(last) = valuation.final_record() {
                eprintln!("Final Position:   {:.2} lots", last.position);
                eprintln!("Floating P&L:     {:.2}", last.floating_pnl);
                eprintln!("Closed P&L:       {:.2}", last.closed_pnl);
                eprintln!("Total P&L:        {:.2}", last.total_pnl);
            }
        }
        None => eprintln!("\n(no price data: ledger-only mode)"),
    }
}
