//! CLI definition and dispatch for the replay host.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{build_run_config, RunConfig};
use crate::domain::core::{BarStrategy, StrategyCore};
use crate::domain::error::CoreError;
use crate::domain::event::StrategyEvent;
use crate::domain::ohlcv::Bar;
use crate::domain::order::{OrderIntent, OrderSide};
use crate::domain::outcome::{PerformanceSnapshot, RMultipleRecord};
use crate::domain::strategy::{CapitalMode, CapitalSource};
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "tharptrader", about = "Trend-filtered crossover strategy replay")]
pub struct Cli {
    /// Log entries, exits and skipped entries
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Log per-bar signal evaluation
    #[arg(long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay historical bars through the strategy core
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        /// CSV file, or a data directory when --symbol is given
        #[arg(short, long)]
        bars: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a data directory
    Symbols {
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Everything a replay produced.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub bars: usize,
    pub orders: Vec<OrderIntent>,
    pub records: Vec<RMultipleRecord>,
    pub stats: PerformanceSnapshot,
    pub events: Vec<StrategyEvent>,
    pub final_equity: f64,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Replay {
            config,
            bars,
            symbol,
        } => run_replay_command(&config, &bars, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Symbols { data } => run_symbols(&data),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_run_config(path: &Path) -> Result<RunConfig, ExitCode> {
    let adapter = load_config(path)?;
    build_run_config(&adapter).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_bars(bars_path: &Path, symbol: Option<&str>) -> Result<Vec<Bar>, CoreError> {
    match symbol {
        Some(symbol) => CsvAdapter::new(bars_path.to_path_buf()).fetch_bars(symbol),
        None => CsvAdapter::read_file(bars_path),
    }
}

fn run_replay_command(config_path: &Path, bars_path: &Path, symbol: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let run = match load_run_config(config_path) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let bars = match load_bars(bars_path, symbol) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    match symbol {
        Some(s) => eprintln!("Replaying {} bars of {}", bars.len(), s),
        None => eprintln!("Replaying {} bars from {}", bars.len(), bars_path.display()),
    }

    let report = match run_replay(&run, &bars) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for order in &report.orders {
        println!("{order}");
    }
    print_summary(&report, run.capital);
    ExitCode::SUCCESS
}

/// Drive a fresh core over `bars` in order.
///
/// Fills are assumed at the triggering close. In equity mode the core sizes
/// off initial capital plus the realised PnL of closed trades.
pub fn run_replay(run: &RunConfig, bars: &[Bar]) -> Result<ReplayReport, CoreError> {
    let equity = Arc::new(Mutex::new(run.capital));
    let capital = match run.capital_mode {
        CapitalMode::Fixed => CapitalSource::Fixed(run.capital),
        CapitalMode::Equity => {
            let shared = Arc::clone(&equity);
            CapitalSource::provider(move || current_equity(&shared))
        }
    };

    let mut core = StrategyCore::new(run.strategy.clone(), capital);
    core.on_init();

    let mut orders = Vec::new();
    let mut open: Option<(OrderSide, u64, f64)> = None;
    for bar in bars {
        let decision = core.on_bar(bar)?;
        for order in decision.orders {
            match order.side {
                OrderSide::Buy | OrderSide::Short => {
                    open = Some((order.side, order.size, bar.close));
                }
                OrderSide::Sell | OrderSide::Cover => {
                    if let Some((side, size, entry)) = open.take() {
                        let pnl = realized_pnl(side, size, entry, bar.close);
                        let mut balance = equity.lock().unwrap_or_else(PoisonError::into_inner);
                        *balance += pnl;
                        tracing::debug!(pnl, balance = *balance, "trade closed");
                    }
                }
            }
            orders.push(order);
        }
    }

    core.on_stop();

    Ok(ReplayReport {
        bars: bars.len(),
        orders,
        records: core.r_records().to_vec(),
        stats: core.stats(),
        events: core.events().to_vec(),
        final_equity: current_equity(&equity),
    })
}

fn current_equity(equity: &Mutex<f64>) -> f64 {
    *equity.lock().unwrap_or_else(PoisonError::into_inner)
}

fn realized_pnl(opening: OrderSide, size: u64, entry: f64, exit: f64) -> f64 {
    let per_unit = match opening {
        OrderSide::Short => entry - exit,
        _ => exit - entry,
    };
    per_unit * size as f64
}

fn print_summary(report: &ReplayReport, initial_capital: f64) {
    let s = &report.stats;
    eprintln!("\n=== R-Multiple Summary ===");
    eprintln!("Bars:             {}", report.bars);
    eprintln!("Orders:           {}", report.orders.len());
    eprintln!("Trades:           {}", s.trade_count);
    if !s.has_trades {
        eprintln!("No closed trades.");
        return;
    }
    eprintln!("Win Rate:         {:.1}%", s.win_rate * 100.0);
    eprintln!("Wins / Losses:    {} / {}", s.wins, s.losses);
    eprintln!("Mean R:           {:.4}", s.mean_r);
    eprintln!("Std R:            {:.4}", s.std_r);
    eprintln!("SQN:              {:.4}", s.sqn);
    eprintln!("Total R:          {:.4}", s.total_r);
    eprintln!("Max R Drawdown:   {:.4}", s.max_r_drawdown);
    eprintln!("Avg Win / Loss:   {:.4} / {:.4}", s.avg_win_r, s.avg_loss_r);
    eprintln!("Largest Win/Loss: {:.4} / {:.4}", s.largest_win_r, s.largest_loss_r);
    eprintln!(
        "Equity:           {:.2} -> {:.2}",
        initial_capital, report.final_equity
    );
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let run = match load_run_config(config_path) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let s = &run.strategy;
    eprintln!("\n[strategy]");
    eprintln!("  crossover:        {} / {}", s.fast_window, s.slow_window);
    eprintln!(
        "  trend filter:     {} / {} / {} x{}",
        s.filter_fast, s.filter_mid, s.filter_slow, s.filter_multiplier
    );
    match s.aggregation_multiple {
        Some(k) => eprintln!(
            "  filter timeframe: {}s buckets ({} x {}s)",
            u64::from(k) * u64::from(s.bar_interval_secs),
            k,
            s.bar_interval_secs
        ),
        None => eprintln!("  filter timeframe: primary bars"),
    }
    eprintln!("  window capacity:  {}", s.window_capacity);
    eprintln!("  warm-up bars:     {}", s.warmup_bars());
    eprintln!("\n[risk]");
    eprintln!("  atr:              {} x{}", s.atr_window, s.atr_multiple);
    eprintln!("  risk fraction:    {}", s.risk_fraction);
    match s.position_cap {
        Some(cap) => eprintln!("  position cap:     {cap}"),
        None => eprintln!("  position cap:     none"),
    }
    eprintln!("  price offset:     {}", s.price_offset);
    eprintln!("  capital:          {} ({:?})", run.capital, run.capital_mode);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_symbols(data_dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    match adapter.list_symbols() {
        Ok(symbols) => {
            if symbols.is_empty() {
                eprintln!("No symbols found in {}", data_dir.display());
            }
            for symbol in &symbols {
                println!("{symbol}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
