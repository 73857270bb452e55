//! Bar-driven strategy core.
//!
//! Per bar: update windows, stay silent until every window is inited, run
//! the trailing-stop exit check, then (only if the bar started flat) look
//! for a trend-aligned crossover entry. Fills are assumed to apply as soon
//! as an order intent is emitted.

use chrono::NaiveDateTime;

use crate::domain::aggregator::BarAggregator;
use crate::domain::bar_window::BarWindow;
use crate::domain::crossover::CrossoverSignal;
use crate::domain::error::CoreError;
use crate::domain::event::{EventKind, SkipReason, StrategyEvent};
use crate::domain::exit_manager::{ExitManager, ExitSignal};
use crate::domain::ohlcv::Bar;
use crate::domain::order::{OrderIntent, OrderSide};
use crate::domain::outcome::{OutcomeTracker, PerformanceSnapshot, RMultipleRecord};
use crate::domain::position::{Direction, PositionState, TrailingStopState};
use crate::domain::signal::Bias;
use crate::domain::sizing::PositionSizer;
use crate::domain::strategy::{CapitalSource, StrategyConfig};
use crate::domain::trend_filter::TrendFilter;

/// Lifecycle driven by the host.
pub trait BarStrategy {
    /// Bars the host should feed before expecting decisions.
    fn warmup_bars(&self) -> usize;
    fn on_init(&mut self);
    fn on_bar(&mut self, bar: &Bar) -> Result<BarDecision, CoreError>;
    fn on_stop(&mut self);
}

/// What one bar produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarDecision {
    pub orders: Vec<OrderIntent>,
    pub closed_trade: Option<RMultipleRecord>,
}

impl BarDecision {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.closed_trade.is_none()
    }
}

/// Higher-timeframe feed: aggregator plus the window it fills.
#[derive(Debug, Clone)]
struct FilterFeed {
    aggregator: BarAggregator,
    window: BarWindow,
}

#[derive(Debug)]
pub struct StrategyCore {
    config: StrategyConfig,
    capital: CapitalSource,
    crossover: CrossoverSignal,
    trend: TrendFilter,
    sizer: PositionSizer,
    primary: BarWindow,
    filter_feed: Option<FilterFeed>,
    exits: ExitManager,
    outcomes: OutcomeTracker,
    position: i64,
    events: Vec<StrategyEvent>,
}

impl StrategyCore {
    pub fn new(config: StrategyConfig, capital: CapitalSource) -> Self {
        let primary = BarWindow::new(config.window_capacity, config.warmup_bars());
        let filter_feed = config.aggregation_multiple.map(|multiple| {
            let lookback = config.filter_lookback();
            FilterFeed {
                aggregator: BarAggregator::new(config.bar_interval_secs, multiple),
                window: BarWindow::new(lookback + 1, lookback),
            }
        });

        Self {
            crossover: config.crossover(),
            trend: config.trend_filter(),
            sizer: config.sizer(),
            exits: ExitManager::new(config.atr_multiple),
            outcomes: OutcomeTracker::new(),
            position: 0,
            events: Vec::new(),
            primary,
            filter_feed,
            capital,
            config,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// True once every owned window has seen its warm-up.
    pub fn inited(&self) -> bool {
        self.primary.inited()
            && self
                .filter_feed
                .as_ref()
                .is_none_or(|feed| feed.window.inited())
    }

    /// Signed quantity: positive long, negative short, zero flat.
    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn state(&self) -> PositionState {
        self.exits.state()
    }

    pub fn trailing_stop(&self) -> Option<&TrailingStopState> {
        self.exits.stop()
    }

    pub fn primary_window(&self) -> &BarWindow {
        &self.primary
    }

    /// Window the trend filter is evaluated on.
    pub fn filter_window(&self) -> &BarWindow {
        match &self.filter_feed {
            Some(feed) => &feed.window,
            None => &self.primary,
        }
    }

    pub fn r_records(&self) -> &[RMultipleRecord] {
        self.outcomes.records()
    }

    pub fn stats(&self) -> PerformanceSnapshot {
        self.outcomes.stats()
    }

    pub fn events(&self) -> &[StrategyEvent] {
        &self.events
    }

    /// Current trend regime, neutral before enough data.
    pub fn regime(&self) -> Bias {
        self.trend.regime(self.filter_window())
    }

    /// Reinitialise windows, stop state, outcomes, position and event log.
    pub fn reset(&mut self) {
        self.primary.clear();
        if let Some(feed) = self.filter_feed.as_mut() {
            feed.aggregator.reset();
            feed.window.clear();
        }
        self.exits.reset();
        self.outcomes.clear();
        self.position = 0;
        self.events.clear();
        self.push_event(None, EventKind::Reset);
        tracing::info!("strategy reset");
    }

    fn push_event(&mut self, timestamp: Option<NaiveDateTime>, kind: EventKind) {
        self.events.push(StrategyEvent { timestamp, kind });
    }

    fn update_windows(&mut self, bar: &Bar) -> Result<(), CoreError> {
        self.primary.update(bar.clone())?;
        if let Some(feed) = self.filter_feed.as_mut() {
            if let Some(higher) = feed.aggregator.update(bar) {
                tracing::trace!(bucket = %higher.timestamp, close = higher.close, "aggregated bar");
                feed.window.update(higher)?;
            }
        }
        Ok(())
    }

    fn apply_exit(&mut self, exit: ExitSignal, decision: &mut BarDecision) {
        let side = OrderSide::closing(exit.direction);
        let size = self.position.unsigned_abs();
        decision.orders.push(OrderIntent::new(
            exit.timestamp,
            side,
            exit.exit_price,
            self.config.price_offset,
            size,
        ));
        self.position = 0;

        match exit.r_multiple {
            Some(r) => {
                let record = self.outcomes.record(exit.timestamp, r).clone();
                decision.closed_trade = Some(record);
            }
            None => tracing::warn!(
                timestamp = %exit.timestamp,
                "exit with zero initial risk, no R-multiple recorded"
            ),
        }

        tracing::info!(
            timestamp = %exit.timestamp,
            %side,
            size,
            price = exit.exit_price,
            stop = exit.stop_price,
            r = ?exit.r_multiple,
            "trailing stop hit"
        );
        self.push_event(
            Some(exit.timestamp),
            EventKind::Exited {
                side,
                size,
                price: exit.exit_price,
                r_multiple: exit.r_multiple,
            },
        );
    }

    fn try_enter(
        &mut self,
        bar: &Bar,
        direction: Direction,
        atr: Option<f64>,
        decision: &mut BarDecision,
    ) {
        let Some(atr) = atr else {
            self.skip_entry(bar.timestamp, SkipReason::AtrUnavailable);
            return;
        };

        if let Err(err) = self.sizer.risk_per_unit(atr) {
            tracing::info!(timestamp = %bar.timestamp, %err, "entry skipped");
            self.skip_entry(bar.timestamp, SkipReason::DegenerateRisk);
            return;
        }

        let capital = self.capital.current();
        let size = self.sizer.size(capital, atr);
        if size == 0 {
            tracing::info!(
                timestamp = %bar.timestamp,
                capital,
                atr,
                "entry skipped: size rounds to zero"
            );
            self.skip_entry(bar.timestamp, SkipReason::ZeroSize);
            return;
        }

        let side = OrderSide::opening(direction);
        decision.orders.push(OrderIntent::new(
            bar.timestamp,
            side,
            bar.close,
            self.config.price_offset,
            size,
        ));
        // size is bounded by capital / risk, far inside i64
        let quantity = i64::try_from(size).unwrap_or(i64::MAX);
        self.position = match direction {
            Direction::Long => quantity,
            Direction::Short => -quantity,
        };
        let stop_price = self
            .exits
            .open(direction, bar.close, atr, bar.timestamp)
            .stop_price;

        tracing::info!(
            timestamp = %bar.timestamp,
            %side,
            size,
            price = bar.close,
            stop = stop_price,
            "entry"
        );
        self.push_event(
            Some(bar.timestamp),
            EventKind::Entered {
                side,
                size,
                price: bar.close,
                stop_price,
            },
        );
    }

    fn skip_entry(&mut self, timestamp: NaiveDateTime, reason: SkipReason) {
        self.push_event(Some(timestamp), EventKind::EntrySkipped { reason });
    }
}

impl BarStrategy for StrategyCore {
    fn warmup_bars(&self) -> usize {
        self.config.warmup_bars()
    }

    fn on_init(&mut self) {
        let warmup_bars = self.warmup_bars();
        tracing::info!(warmup_bars, "strategy initialized");
        self.push_event(None, EventKind::Initialized { warmup_bars });
    }

    fn on_bar(&mut self, bar: &Bar) -> Result<BarDecision, CoreError> {
        self.update_windows(bar)?;

        let mut decision = BarDecision::default();
        if !self.inited() {
            return Ok(decision);
        }

        let atr = self.primary.atr(self.config.atr_window).ok();
        let started_flat = self.position == 0;

        if let Some(exit) = self.exits.on_bar(bar, atr) {
            self.apply_exit(exit, &mut decision);
        }

        if started_flat {
            let regime = self.trend.regime(self.filter_window());
            let signal = self.crossover.signal(&self.primary);
            tracing::debug!(timestamp = %bar.timestamp, %regime, %signal, "entry check");

            // regime and crossover must agree on a non-zero sign
            let direction = match (regime.signum(), signal.signum()) {
                (1, 1) => Some(Direction::Long),
                (-1, -1) => Some(Direction::Short),
                _ => None,
            };
            if let Some(direction) = direction {
                self.try_enter(bar, direction, atr, &mut decision);
            }
        }

        Ok(decision)
    }

    fn on_stop(&mut self) {
        let stats = self.stats();
        tracing::info!(
            trades = stats.trade_count,
            sqn = stats.sqn,
            total_r = stats.total_r,
            "strategy stopped"
        );
        self.push_event(None, EventKind::Stopped);
    }
}
