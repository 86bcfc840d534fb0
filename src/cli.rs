//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, SimulationResult};
use crate::domain::config_validation::{read_double, validate_config};
use crate::domain::error::SwingtraderError;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{BreakoutParams, PlanConfig, PlanKind, RetracementParams};
use crate::domain::swing::{build_swing_sequence, detect_swings, SwingMethod};
use crate::domain::sweep::{run_sweep, sweep_methods};
use crate::domain::trend::{MaType, TrendConfig, TrendSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Trades listed in the console summary.
const SUMMARY_TRADES: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "swingtrader", about = "Swing retracement and breakout backtester")]
pub struct Cli {
    /// trace, debug, info, warn or error
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Bar CSV, overrides [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Write the trade log to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the detected swing sequence
    Swings {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Backtest once per swing parameter and rank by win rate
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// local_extrema, zigzag or fractal
        #[arg(short, long)]
        method: String,
        /// Comma-separated parameter values, e.g. 3,5,10
        #[arg(short, long)]
        params: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(&cli.log_level);

    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
        } => run_backtest_command(&config, data.as_deref(), output.as_deref()),
        Command::Swings { config, data } => run_swings(&config, data.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Sweep {
            config,
            data,
            method,
            params,
        } => run_sweep_command(&config, data.as_deref(), &method, &params),
    }
}

pub fn parse_log_level(value: &str) -> Level {
    match value.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(level: &str) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_log_level(level))
        .with_writer(std::io::stderr)
        .finish();
    // a subscriber may already be installed when `run` is called twice in
    // one process
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn fail(err: SwingtraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(SwingtraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

fn config_invalid(section: &str, key: &str, err: SwingtraderError) -> SwingtraderError {
    SwingtraderError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: err.to_string(),
    }
}

fn default_swing_param(method: &str) -> f64 {
    match method.trim().to_lowercase().as_str() {
        "zigzag" => 0.01,
        "fractal" => 2.0,
        _ => 5.0,
    }
}

pub fn build_swing_method(adapter: &dyn ConfigPort) -> Result<SwingMethod, SwingtraderError> {
    let name = adapter
        .get_string("swing", "method")
        .unwrap_or_else(|| "local_extrema".to_string());
    let param = read_double(adapter, "swing", "param")?.unwrap_or(default_swing_param(&name));
    SwingMethod::from_name(&name, param).map_err(|e| config_invalid("swing", "param", e))
}

pub fn build_plan_config(adapter: &dyn ConfigPort) -> Result<PlanConfig, SwingtraderError> {
    let kind_name = adapter
        .get_string("plan", "kind")
        .unwrap_or_else(|| "retracement".to_string());
    let kind = PlanKind::from_name(&kind_name).map_err(|e| config_invalid("plan", "kind", e))?;

    let plan = match kind {
        PlanKind::Retracement => {
            let defaults = RetracementParams::default();
            let section = "retracement";
            PlanConfig::Retracement(RetracementParams {
                entry_ratio: read_double(adapter, section, "entry_ratio")?
                    .unwrap_or(defaults.entry_ratio),
                stop_ratio: read_double(adapter, section, "stop_ratio")?
                    .unwrap_or(defaults.stop_ratio),
                target_ratio: read_double(adapter, section, "target_ratio")?
                    .unwrap_or(defaults.target_ratio),
                partial_target_ratio: read_double(adapter, section, "partial_target_ratio")?,
                partial_fraction: read_double(adapter, section, "partial_fraction")?
                    .unwrap_or(defaults.partial_fraction),
                post_partial_stop_ratio: read_double(adapter, section, "post_partial_stop_ratio")?,
                move_stop_to_breakeven: adapter.get_bool(
                    section,
                    "move_stop_to_breakeven",
                    defaults.move_stop_to_breakeven,
                ),
            })
        }
        PlanKind::Breakout => {
            let defaults = BreakoutParams::default();
            PlanConfig::Breakout(BreakoutParams {
                r_multiple: read_double(adapter, "breakout", "r_multiple")?
                    .unwrap_or(defaults.r_multiple),
                fee_rate: read_double(adapter, "breakout", "fee_rate")?
                    .unwrap_or(defaults.fee_rate),
            })
        }
    };

    plan.validate()
        .map_err(|e| config_invalid(&kind.to_string(), "parameters", e))?;
    Ok(plan)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SwingtraderError> {
    Ok(BacktestConfig {
        swing_method: build_swing_method(adapter)?,
        plan: build_plan_config(adapter)?,
        trend_filter_enabled: adapter.get_bool("trend", "enabled", true),
        parallel: adapter.get_bool("backtest", "parallel", false),
    })
}

pub fn build_trend_config(adapter: &dyn ConfigPort) -> Result<TrendConfig, SwingtraderError> {
    let defaults = TrendConfig::default();
    let ma_type = match adapter.get_string("trend", "ma_type") {
        Some(name) => MaType::from_name(&name).map_err(|e| config_invalid("trend", "ma_type", e))?,
        None => defaults.ma_type,
    };
    let period = adapter.get_int("trend", "period", defaults.period as i64);
    if period <= 0 {
        return Err(SwingtraderError::ConfigInvalid {
            section: "trend".into(),
            key: "period".into(),
            reason: "period must be positive".into(),
        });
    }
    Ok(TrendConfig {
        ma_type,
        period: period as usize,
    })
}

pub fn resolve_data_path(
    data_override: Option<&Path>,
    adapter: &dyn ConfigPort,
) -> Result<PathBuf, SwingtraderError> {
    if let Some(path) = data_override {
        return Ok(path.to_path_buf());
    }
    match adapter.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => Ok(PathBuf::from(p.trim())),
        _ => Err(SwingtraderError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        }),
    }
}

pub fn parse_params(params: &str) -> Result<Vec<f64>, SwingtraderError> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<f64>().map_err(|_| SwingtraderError::InvalidParameter {
                name: "params".into(),
                reason: format!("'{p}' is not a number"),
            })
        })
        .collect()
}

/// Everything a run needs once configuration and data are loaded.
struct Prepared {
    config: BacktestConfig,
    bars: Vec<Bar>,
    trend: Option<TrendSeries>,
}

impl Prepared {
    fn trend(&self) -> Option<&[Option<f64>]> {
        self.trend.as_deref()
    }
}

fn prepare(config_path: &Path, data_override: Option<&Path>) -> Result<Prepared, ExitCode> {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_config(&adapter).map_err(fail)?;
    let config = build_backtest_config(&adapter).map_err(fail)?;
    let trend_config = build_trend_config(&adapter).map_err(fail)?;

    // Stage 2: Load bars
    let data_path = resolve_data_path(data_override, &adapter).map_err(fail)?;
    eprintln!("Loading bars from {}", data_path.display());
    let base = data_path.parent().map(Path::to_path_buf).unwrap_or_default();
    let source = data_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            fail(SwingtraderError::Data {
                reason: format!("{} is not a file path", data_path.display()),
            })
        })?;
    let bars = CsvAdapter::new(base).fetch_bars(&source).map_err(fail)?;
    eprintln!("  {} bars", bars.len());

    // Stage 3: Trend series
    let trend = if config.trend_filter_enabled {
        eprintln!(
            "  trend filter: {}({})",
            trend_config.ma_type, trend_config.period
        );
        Some(trend_config.compute(&bars))
    } else {
        None
    };

    Ok(Prepared {
        config,
        bars,
        trend,
    })
}

fn run_backtest_command(
    config_path: &Path,
    data_override: Option<&Path>,
    output_path: Option<&Path>,
) -> ExitCode {
    let prepared = match prepare(config_path, data_override) {
        Ok(p) => p,
        Err(code) => return code,
    };

    eprintln!(
        "Running backtest: {} swings, {} plans",
        prepared.config.swing_method,
        prepared.config.plan.kind()
    );
    let result = match run_backtest(&prepared.bars, prepared.trend(), &prepared.config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_summary(&result);

    if let Some(output) = output_path {
        if let Err(e) = CsvReportAdapter.write(&result, output) {
            return fail(e);
        }
        eprintln!("\nTrade log written to: {}", output.display());
    }

    ExitCode::SUCCESS
}

fn print_summary(result: &SimulationResult) {
    let stats = &result.stats;
    eprintln!("\n=== Results ===");
    eprintln!("Swing Points:     {}", result.swing_points.len());
    eprintln!("Plans:            {}", result.plans);
    eprintln!("Skipped Pairs:    {}", result.skipped.len());
    eprintln!("Unfilled Plans:   {}", result.unfilled);
    eprintln!("Total Trades:     {}", stats.trade_count);
    eprintln!("Wins / Losses:    {} / {}", stats.winning_trades, stats.losing_trades);
    eprintln!("Win Rate:         {:.2}%", stats.win_rate * 100.0);
    eprintln!("Avg Win:          {:.3}%", stats.avg_win * 100.0);
    eprintln!("Avg Loss:         {:.3}%", stats.avg_loss * 100.0);
    eprintln!("Largest Win:      {:.3}%", stats.largest_win * 100.0);
    eprintln!("Largest Loss:     {:.3}%", stats.largest_loss * 100.0);
    eprintln!("Total Return:     {:.2}%", stats.total_return_pct);
    eprintln!("Final Equity:     {:.4}", stats.final_equity);
    eprintln!("Max Drawdown:     -{:.2}%", stats.max_drawdown * 100.0);

    if !result.trades.is_empty() {
        eprintln!("\n=== First {} Trades ===", SUMMARY_TRADES.min(result.trades.len()));
        for trade in result.trades.iter().take(SUMMARY_TRADES) {
            eprintln!(
                "  {} {} @ {:.5} ({}) -> {:.5} ({}), {:+.3}%, {} leg(s)",
                trade.direction,
                trade.kind,
                trade.entry_price,
                trade.entry_time,
                trade.exit_price,
                trade.exit_time,
                trade.realized_pct() * 100.0,
                trade.legs.len(),
            );
        }
    }
}

fn run_swings(config_path: &Path, data_override: Option<&Path>) -> ExitCode {
    let prepared = match prepare(config_path, data_override) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let swings = match detect_swings(&prepared.bars, prepared.config.swing_method) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let sequence = build_swing_sequence(&prepared.bars, &swings);
    eprintln!(
        "{}: {} highs, {} lows",
        prepared.config.swing_method,
        swings.highs.len(),
        swings.lows.len()
    );

    println!("index,time,kind,price");
    for point in &sequence {
        let time = prepared
            .bars
            .get(point.index)
            .map(|b| b.time.to_string())
            .unwrap_or_default();
        println!("{},{},{},{}", point.index, time, point.kind, point.price);
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&adapter) {
        return fail(e);
    }
    let config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let trend = match build_trend_config(&adapter) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    eprintln!("Configuration is valid.");
    eprintln!("  swing:   {}", config.swing_method);
    eprintln!("  plan:    {}", config.plan.kind());
    if config.trend_filter_enabled {
        eprintln!("  trend:   {}({})", trend.ma_type, trend.period);
    } else {
        eprintln!("  trend:   disabled");
    }
    eprintln!("  parallel: {}", config.parallel);
    ExitCode::SUCCESS
}

fn run_sweep_command(
    config_path: &Path,
    data_override: Option<&Path>,
    method: &str,
    params: &str,
) -> ExitCode {
    let methods = match parse_params(params).and_then(|p| sweep_methods(method, &p)) {
        Ok(m) if !m.is_empty() => m,
        Ok(_) => {
            return fail(SwingtraderError::InvalidParameter {
                name: "params".into(),
                reason: "no parameter values given".into(),
            })
        }
        Err(e) => return fail(e),
    };

    let prepared = match prepare(config_path, data_override) {
        Ok(p) => p,
        Err(code) => return code,
    };

    eprintln!("Sweeping {} {} configurations", methods.len(), method);
    let rows = run_sweep(&prepared.bars, prepared.trend(), &prepared.config, &methods);

    println!("method,swings,trades,win_rate_pct,total_return_pct,max_drawdown_pct");
    for row in &rows {
        println!(
            "{},{},{},{:.2},{:.2},{:.2}",
            row.method,
            row.swings,
            row.trades,
            row.win_rate * 100.0,
            row.total_return_pct,
            row.max_drawdown * 100.0
        );
    }
    ExitCode::SUCCESS
}
