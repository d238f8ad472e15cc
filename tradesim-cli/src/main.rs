//! Tradesim CLI: backtests, paper ticks, sweeps and log summaries.
//!
//! Commands:
//! - `backtest`: replay a candle snapshot and print the result
//! - `paper`: apply one paper-trading tick for the latest candle
//! - `sweep`: backtest a parameter grid in parallel and rank by Sharpe
//! - `summary backtests` / `summary paper`: report from the JSONL logs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use tradesim_core::{run_backtest, StrategyConfig, StrategyKind};
use tradesim_runner::{
    export_trades_csv, load_snapshot, run_sweep, ParamGrid, PaperTrader, RunnerConfig,
};

#[derive(Parser)]
#[command(name = "tradesim", about = "Tradesim: deterministic strategy backtesting and paper trading")]
struct Cli {
    /// Runner config (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory for paper state and logs.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Strategy overrides shared by the engine commands.
#[derive(clap::Args, Debug, Default)]
struct StrategyArgs {
    /// Strategy kind (sma_cross, rsi).
    #[arg(long)]
    strategy: Option<String>,

    /// Strategy parameter as key=value (repeatable), e.g. --param fast=5.
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, f64)>,

    /// Starting capital.
    #[arg(long)]
    capital: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a candle snapshot through the strategy.
    Backtest {
        /// Snapshot JSON (array of candles or object with `candles`).
        snapshot: PathBuf,

        /// Symbol label for the run.
        #[arg(long)]
        symbol: String,

        /// Candle interval label. Defaults to the config's interval.
        #[arg(long)]
        interval: Option<String>,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Append the result to the backtest log.
        #[arg(long, default_value_t = false)]
        log: bool,

        /// Write the closed-trade ledger to this CSV file.
        #[arg(long)]
        export_csv: Option<PathBuf>,

        /// Print the full result as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Apply one paper-trading tick using the latest candle of a snapshot.
    Paper {
        snapshot: PathBuf,

        #[arg(long)]
        symbol: String,

        #[arg(long)]
        interval: Option<String>,

        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Backtest the default parameter grid for the strategy kind.
    Sweep {
        snapshot: PathBuf,

        #[arg(long)]
        symbol: String,

        #[arg(long)]
        interval: Option<String>,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Number of ranked entries to print.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Summaries from the append-only logs.
    Summary {
        #[command(subcommand)]
        target: SummaryTarget,
    },
}

#[derive(Subcommand)]
enum SummaryTarget {
    /// Best Sharpe, best ROI and latest backtest.
    Backtests {
        /// Only rows from the last N days (0 = all).
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// Only rows for this symbol (case-insensitive).
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Closed paper-trade statistics.
    Paper {
        #[arg(long, default_value_t = 30)]
        days: u32,

        #[arg(long)]
        symbol: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.data_dir)?;

    match cli.command {
        Commands::Backtest {
            snapshot,
            symbol,
            interval,
            strategy,
            log,
            export_csv,
            json,
        } => run_backtest_cmd(
            &config,
            &snapshot,
            &symbol,
            interval,
            &strategy,
            log,
            export_csv.as_deref(),
            json,
        ),
        Commands::Paper {
            snapshot,
            symbol,
            interval,
            strategy,
        } => run_paper_cmd(&config, &snapshot, &symbol, interval, &strategy),
        Commands::Sweep {
            snapshot,
            symbol,
            interval,
            strategy,
            top,
        } => run_sweep_cmd(&config, &snapshot, &symbol, interval, &strategy, top),
        Commands::Summary { target } => match target {
            SummaryTarget::Backtests { days, symbol } => {
                run_backtest_summary(&config, days, symbol.as_deref())
            }
            SummaryTarget::Paper { days, symbol } => {
                run_paper_summary(&config, days, symbol.as_deref())
            }
        },
    }
}

fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<RunnerConfig> {
    let mut config = match path {
        Some(p) => RunnerConfig::load(p)
            .with_context(|| format!("loading config {}", p.display()))?,
        None => RunnerConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}

fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("parameter '{key}' is not a number: '{value}'"))?;
    Ok((key.trim().to_string(), value))
}

/// Apply command-line overrides to the configured strategy.
fn resolve_strategy(config: &RunnerConfig, args: &StrategyArgs) -> Result<StrategyConfig> {
    let mut strategy = config.strategy.clone();
    if let Some(kind) = &args.strategy {
        let kind = StrategyKind::from(kind.as_str());
        if kind != strategy.kind {
            // Parameters of another family do not carry over.
            strategy.params.clear();
        }
        strategy.kind = kind;
    }
    for (key, value) in &args.params {
        strategy = strategy.with_param(key.clone(), *value);
    }
    if let Some(capital) = args.capital {
        strategy = strategy.with_capital(capital);
    }
    strategy.validate().context("invalid strategy overrides")?;
    if let StrategyKind::Unknown(name) = &strategy.kind {
        tracing::warn!(kind = %name, "unknown strategy kind, running the SMA cross defaults");
    }
    Ok(strategy)
}

#[allow(clippy::too_many_arguments)]
fn run_backtest_cmd(
    config: &RunnerConfig,
    snapshot: &Path,
    symbol: &str,
    interval: Option<String>,
    args: &StrategyArgs,
    log: bool,
    export_csv: Option<&Path>,
    json: bool,
) -> Result<()> {
    let strategy = resolve_strategy(config, args)?;
    let interval = interval.unwrap_or_else(|| config.interval.clone());
    let report = load_snapshot(snapshot)?;

    let result = run_backtest(&report.candles, symbol, &interval, &strategy);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.summary());
    }

    if log {
        config
            .backtest_log()
            .append(&result, chrono::Utc::now())
            .context("appending to backtest log")?;
    }
    if let Some(path) = export_csv {
        export_trades_csv(path, &result.trades)
            .with_context(|| format!("exporting trades to {}", path.display()))?;
        println!("Trades exported to: {}", path.display());
    }

    if let Some(err) = &result.error {
        bail!("{err}");
    }
    Ok(())
}

fn run_paper_cmd(
    config: &RunnerConfig,
    snapshot: &Path,
    symbol: &str,
    interval: Option<String>,
    args: &StrategyArgs,
) -> Result<()> {
    let strategy = resolve_strategy(config, args)?;
    let interval = interval.unwrap_or_else(|| config.interval.clone());
    let report = load_snapshot(snapshot)?;

    let trader = PaperTrader::from_config(config);
    match trader.tick(&report.candles, symbol, &interval, &strategy, chrono::Utc::now()) {
        Ok(cycle) => {
            println!("{}", cycle.summary());
            Ok(())
        }
        Err(err) => bail!(err.summary()),
    }
}

fn run_sweep_cmd(
    config: &RunnerConfig,
    snapshot: &Path,
    symbol: &str,
    interval: Option<String>,
    args: &StrategyArgs,
    top: usize,
) -> Result<()> {
    let base = resolve_strategy(config, args)?;
    let interval = interval.unwrap_or_else(|| config.interval.clone());
    let report = load_snapshot(snapshot)?;

    let grid = ParamGrid::default_for(&base.kind);
    let results = run_sweep(&report.candles, symbol, &interval, &grid, &base);
    if results.is_empty() {
        bail!("parameter grid produced no valid configurations");
    }

    println!("SWEEP: {symbol} ({interval}) {} | {} configs", base.kind, results.len());
    println!(
        "{:<4} {:<32} {:>7} {:>8} {:>8} {:>10}",
        "#", "Params", "Trades", "Sharpe", "Win %", "ROI %"
    );
    println!("{}", "-".repeat(74));
    for (rank, entry) in results.top_n(top).into_iter().enumerate() {
        let params: Vec<String> = entry
            .config
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let r = &entry.result;
        if let Some(err) = &r.error {
            println!("{:<4} {:<32} {err}", rank + 1, params.join(" "));
            continue;
        }
        println!(
            "{:<4} {:<32} {:>7} {:>8.2} {:>8.1} {:>10.2}",
            rank + 1,
            params.join(" "),
            r.total_trades,
            r.sharpe_ratio,
            r.win_rate * 100.0,
            r.roi * 100.0
        );
    }
    Ok(())
}

fn run_backtest_summary(config: &RunnerConfig, days: u32, symbol: Option<&str>) -> Result<()> {
    let summary = config
        .backtest_log()
        .summarize(days, symbol, chrono::Utc::now())
        .context("reading backtest log")?;
    println!("{}", summary.render());
    Ok(())
}

fn run_paper_summary(config: &RunnerConfig, days: u32, symbol: Option<&str>) -> Result<()> {
    let now = chrono::Utc::now();
    let state = config
        .paper_store()
        .read(config.strategy.starting_capital, now)
        .context("reading paper state")?;
    let summary = config
        .paper_trade_log()
        .summarize(days, symbol, state.starting_capital, now)
        .context("reading paper trade log")?;

    println!("{}", summary.render());
    println!("Equity: ${:.2} | Open positions: {}", state.equity, state.positions.len());
    for (sym, p) in &state.positions {
        println!(
            "  {sym}: {} @ {:.4} | notional ${:.2}",
            p.side.as_str(),
            p.entry_price,
            p.notional
        );
    }
    Ok(())
}
