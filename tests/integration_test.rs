//! End-to-end scenarios driving StrategyCore bar by bar.
//!
//! Tests cover:
//! - Long and short entries on trend-aligned crossovers
//! - Trailing-stop exits with exactly one R record per closed trade
//! - Skipped entries (position too small) and the position cap
//! - Injected capital providers
//! - Trend regime taken from aggregated bars when a multiple is set
//! - Replay through the host helper in fixed and equity mode

mod common;

use approx::assert_relative_eq;
use common::*;
use std::sync::{Arc, Mutex};
use tharptrader::cli::run_replay;
use tharptrader::domain::core::{BarDecision, BarStrategy, StrategyCore};
use tharptrader::domain::event::{EventKind, SkipReason};
use tharptrader::domain::order::OrderSide;
use tharptrader::domain::position::PositionState;
use tharptrader::domain::signal::Bias;
use tharptrader::domain::strategy::{CapitalMode, CapitalSource, StrategyConfig};

fn feed(core: &mut StrategyCore, closes: &[f64]) -> Vec<BarDecision> {
    bars_from_closes(closes)
        .iter()
        .map(|b| core.on_bar(b).unwrap())
        .collect()
}

mod long_trade {
    use super::*;

    #[test]
    fn bullish_cross_in_bullish_regime_enters_long() {
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut core, &LONG_LOSER[..6]);

        assert!(decisions[..5].iter().all(|d| d.is_empty()));
        assert_eq!(core.regime(), Bias::Bullish);

        let entry = &decisions[5];
        assert_eq!(entry.orders.len(), 1);
        let order = &entry.orders[0];
        assert_eq!(order.side, OrderSide::Buy);
        // atr = 7/6, risk per unit = 7/3, floor(1000 / (7/3)) = 428
        assert_eq!(order.size, 428);
        assert_relative_eq!(order.price_hint, 102.0);
        assert_eq!(order.timestamp, ts(5));
        assert!(entry.closed_trade.is_none());

        assert_eq!(core.state(), PositionState::Long);
        assert_eq!(core.position(), 428);
        let stop = core.trailing_stop().unwrap();
        assert_relative_eq!(stop.stop_price, 101.0 - 7.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(stop.initial_risk_per_unit, 7.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn stop_ratchets_then_exits_with_one_record() {
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut core, &LONG_LOSER);

        // bar 6 raises the stop to 102.5 - 2 * 23/18
        assert!(decisions[6].is_empty());

        let exit = &decisions[7];
        assert_eq!(exit.orders.len(), 1);
        assert_eq!(exit.orders[0].side, OrderSide::Sell);
        assert_eq!(exit.orders[0].size, 428);
        assert_relative_eq!(exit.orders[0].price_hint, 98.0);

        let record = exit.closed_trade.as_ref().unwrap();
        assert_eq!(record.timestamp, ts(7));
        assert_relative_eq!(record.r_value, -6.0 / 7.0, epsilon = 1e-9);

        assert_eq!(core.state(), PositionState::Flat);
        assert_eq!(core.position(), 0);
        assert!(core.trailing_stop().is_none());
        assert_eq!(core.r_records().len(), 1);
    }

    #[test]
    fn winning_trade_trails_up_and_records_positive_r() {
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        let closes = [
            100.0, 100.0, 100.0, 100.0, 100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 102.0,
        ];
        let decisions = feed(&mut core, &closes);

        assert!(decisions[6..10].iter().all(|d| d.is_empty()));
        let record = decisions[10].closed_trade.as_ref().unwrap();
        assert_relative_eq!(record.r_value, 3.0 / 7.0, epsilon = 1e-9);

        let stats = core.stats();
        assert_eq!(stats.trade_count, 1);
        assert_eq!(stats.wins, 1);
        assert_relative_eq!(stats.win_rate, 1.0);
        assert_relative_eq!(stats.sqn, 0.0);
    }

    #[test]
    fn no_entry_on_the_exit_bar() {
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut core, &LONG_LOSER);
        let exit = &decisions[7];
        assert!(exit.orders.iter().all(|o| o.side == OrderSide::Sell));
    }
}

mod short_trade {
    use super::*;

    #[test]
    fn bearish_cross_in_bearish_regime_enters_short_and_covers() {
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut core, &SHORT_LOSER);

        let entry = &decisions[5];
        assert_eq!(entry.orders.len(), 1);
        assert_eq!(entry.orders[0].side, OrderSide::Short);
        assert_eq!(entry.orders[0].size, 428);
        assert_relative_eq!(entry.orders[0].price_hint, 98.0);

        assert!(decisions[6].is_empty());

        let exit = &decisions[7];
        assert_eq!(exit.orders.len(), 1);
        assert_eq!(exit.orders[0].side, OrderSide::Cover);
        assert_relative_eq!(exit.orders[0].price_hint, 102.0);
        let record = exit.closed_trade.as_ref().unwrap();
        assert_relative_eq!(record.r_value, -6.0 / 7.0, epsilon = 1e-9);
        assert_eq!(core.state(), PositionState::Flat);
    }

    #[test]
    fn short_stop_moves_down_only() {
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        feed(&mut core, &SHORT_LOSER[..6]);
        let opened = core.trailing_stop().unwrap().stop_price;
        assert_relative_eq!(opened, 99.0 + 7.0 / 3.0, epsilon = 1e-9);

        core.on_bar(&bar(6, 98.0)).unwrap();
        let trailed = core.trailing_stop().unwrap().stop_price;
        assert!(trailed < opened);
        assert_eq!(core.state(), PositionState::Short);
    }
}

mod entry_gating {
    use super::*;

    #[test]
    fn tiny_capital_skips_entry() {
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100.0));
        let decisions = feed(&mut core, &LONG_LOSER[..6]);

        assert!(decisions.iter().all(|d| d.is_empty()));
        assert_eq!(core.state(), PositionState::Flat);
        let last = core.events().last().unwrap();
        assert_eq!(
            last.kind,
            EventKind::EntrySkipped {
                reason: SkipReason::ZeroSize
            }
        );
    }

    #[test]
    fn position_cap_limits_size() {
        let config = StrategyConfig {
            position_cap: Some(50),
            ..small_config()
        };
        let mut core = StrategyCore::new(config, CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut core, &LONG_LOSER[..6]);
        assert_eq!(decisions[5].orders[0].size, 50);
        assert_eq!(core.position(), 50);
    }

    #[test]
    fn neutral_regime_blocks_entry() {
        // flat closes tie every average
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut core, &[100.0, 100.0, 100.0, 100.0, 100.0, 100.0]);
        assert!(decisions.iter().all(|d| d.is_empty()));
        assert_eq!(core.regime(), Bias::Neutral);
    }

    #[test]
    fn capital_provider_is_read_per_decision() {
        let capital = Arc::new(Mutex::new(50_000.0));
        let shared = Arc::clone(&capital);
        let source = CapitalSource::provider(move || *shared.lock().unwrap());

        let mut core = StrategyCore::new(small_config(), source);
        let decisions = feed(&mut core, &LONG_LOSER[..6]);
        // floor(500 / (7/3)) = 214
        assert_eq!(decisions[5].orders[0].size, 214);
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn event_log_records_the_trade() {
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        core.on_init();
        feed(&mut core, &LONG_LOSER);
        core.on_stop();

        let kinds: Vec<_> = core.events().iter().map(|e| &e.kind).collect();
        assert_eq!(kinds.len(), 4);
        assert_eq!(kinds[0], &EventKind::Initialized { warmup_bars: 5 });
        assert!(matches!(
            kinds[1],
            EventKind::Entered {
                side: OrderSide::Buy,
                size: 428,
                ..
            }
        ));
        assert!(matches!(
            kinds[2],
            EventKind::Exited {
                side: OrderSide::Sell,
                r_multiple: Some(_),
                ..
            }
        ));
        assert_eq!(kinds[3], &EventKind::Stopped);
    }

    #[test]
    fn reset_allows_a_fresh_replay() {
        let mut core = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        feed(&mut core, &LONG_LOSER[..6]);
        assert_eq!(core.state(), PositionState::Long);

        core.reset();
        assert_eq!(core.state(), PositionState::Flat);
        assert!(core.trailing_stop().is_none());

        let decisions = feed(&mut core, &LONG_LOSER);
        assert_eq!(decisions[5].orders[0].side, OrderSide::Buy);
        assert_eq!(core.r_records().len(), 1);
    }
}

mod replay {
    use super::*;

    #[test]
    fn fixed_capital_replay_collects_orders_and_stats() {
        let run = small_run_config(CapitalMode::Fixed);
        let report = run_replay(&run, &bars_from_closes(&LONG_LOSER)).unwrap();

        assert_eq!(report.bars, 8);
        let sides: Vec<_> = report.orders.iter().map(|o| o.side).collect();
        assert_eq!(sides, vec![OrderSide::Buy, OrderSide::Sell]);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.stats.trade_count, 1);
        assert_eq!(report.stats.losses, 1);
        // 428 units from 101 to 99
        assert_relative_eq!(report.final_equity, 100_000.0 - 856.0);
    }

    #[test]
    fn equity_replay_tracks_realized_pnl() {
        let run = small_run_config(CapitalMode::Equity);
        let report = run_replay(&run, &bars_from_closes(&SHORT_LOSER)).unwrap();
        assert_relative_eq!(report.final_equity, 100_000.0 - 856.0);
        assert_eq!(
            report.events.first().map(|e| &e.kind),
            Some(&EventKind::Initialized { warmup_bars: 5 })
        );
        assert_eq!(
            report.events.last().map(|e| &e.kind),
            Some(&EventKind::Stopped)
        );
    }

    #[test]
    fn equity_mode_sizes_the_next_trade_off_realized_loss() {
        let closes: Vec<f64> = LONG_LOSER
            .iter()
            .copied()
            .chain([99.0, 99.0, 99.0, 99.0, 99.0, 100.0])
            .collect();
        let bars = bars_from_closes(&closes);
        let fixed = run_replay(&small_run_config(CapitalMode::Fixed), &bars).unwrap();
        let equity = run_replay(&small_run_config(CapitalMode::Equity), &bars).unwrap();

        let sized = |report: &tharptrader::cli::ReplayReport| -> Vec<(OrderSide, u64)> {
            report.orders.iter().map(|o| (o.side, o.size)).collect()
        };
        assert_eq!(
            sized(&fixed),
            vec![
                (OrderSide::Buy, 428),
                (OrderSide::Sell, 428),
                (OrderSide::Short, 297)
            ]
        );
        // second entry sizes off 100_000 - 856
        assert_eq!(
            sized(&equity),
            vec![
                (OrderSide::Buy, 428),
                (OrderSide::Sell, 428),
                (OrderSide::Short, 295)
            ]
        );
        assert!(equity.orders[2].size < fixed.orders[2].size);
    }

    #[test]
    fn out_of_order_input_aborts_replay() {
        let run = small_run_config(CapitalMode::Fixed);
        let mut bars = bars_from_closes(&LONG_LOSER);
        bars.swap(2, 3);
        let err = run_replay(&run, &bars).unwrap_err();
        assert!(err.to_string().contains("out-of-order"));
    }
}

mod aggregated_filter {
    use super::*;

    fn aggregated_config() -> StrategyConfig {
        // 2 x 60s bars per filter bar
        StrategyConfig {
            aggregation_multiple: Some(2),
            ..small_config()
        }
    }

    #[test]
    fn bearish_aggregated_regime_blocks_primary_bullish_cross() {
        let closes = [
            110.0, 108.0, 106.0, 104.0, 102.0, 100.0, 98.0, 96.0, 94.0, 92.0, 104.0,
        ];

        let mut primary = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut primary, &closes);
        // primary averages 98 > 96.67 > 96.5
        assert_eq!(primary.regime(), Bias::Bullish);
        assert_eq!(decisions[10].orders.len(), 1);
        assert_eq!(decisions[10].orders[0].side, OrderSide::Buy);

        let mut core = StrategyCore::new(aggregated_config(), CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut core, &closes);
        assert!(core.inited());
        // filter closes 108, 104, 100, 96, 92
        assert_eq!(core.filter_window().len(), 5);
        assert_eq!(core.regime(), Bias::Bearish);
        assert!(decisions.iter().all(|d| d.is_empty()));
        assert_eq!(core.state(), PositionState::Flat);
    }

    #[test]
    fn bullish_aggregated_regime_admits_cross_the_primary_filter_rejects() {
        let closes = [
            100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 112.0, 114.0, 116.0, 118.0, 126.0, 122.0,
            110.0, 140.0,
        ];

        let mut primary = StrategyCore::new(small_config(), CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut primary, &closes);
        // primary averages 125, 124, 124.5 are unordered
        assert_eq!(primary.regime(), Bias::Neutral);
        assert!(decisions.iter().all(|d| d.is_empty()));

        let mut core = StrategyCore::new(aggregated_config(), CapitalSource::Fixed(100_000.0));
        let decisions = feed(&mut core, &closes);
        // filter closes 106, 110, 114, 118, 122; bucket 12-13 still open
        assert_eq!(core.regime(), Bias::Bullish);
        // bar 12 is a bearish cross against the bullish regime
        assert!(decisions[..13].iter().all(|d| d.is_empty()));

        let entry = &decisions[13];
        assert_eq!(entry.orders.len(), 1);
        assert_eq!(entry.orders[0].side, OrderSide::Buy);
        assert!(entry.orders[0].size > 0);
        assert_eq!(core.state(), PositionState::Long);
    }
}
