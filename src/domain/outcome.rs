//! R-multiple outcome tracking and performance statistics.
//!
//! Every statistic is recomputed from the full record list on each query;
//! nothing is accumulated incrementally.
//!
//! win_rate       = |{r > 0}| / n
//! mean_r         = sum(R) / n
//! std_r          = sqrt(sum((r - mean_r)^2) / n), 0 when n < 2
//! sqn            = sqrt(n) * mean_r / std_r, 0 when std_r == 0
//! max_r_drawdown = max_i(running_max(cumsum(R))[i] - cumsum(R)[i])

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RMultipleRecord {
    pub timestamp: NaiveDateTime,
    pub r_value: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformanceSnapshot {
    pub trade_count: usize,
    /// False when there are no closed trades and every ratio below is 0.
    pub has_trades: bool,
    pub win_rate: f64,
    pub mean_r: f64,
    pub std_r: f64,
    pub sqn: f64,
    pub total_r: f64,
    pub max_r_drawdown: f64,
    pub wins: usize,
    pub losses: usize,
    pub avg_win_r: f64,
    /// Magnitude of the average losing R.
    pub avg_loss_r: f64,
    pub largest_win_r: f64,
    /// Magnitude of the worst losing R.
    pub largest_loss_r: f64,
}

impl PerformanceSnapshot {
    pub fn compute(r_values: &[f64]) -> Self {
        let n = r_values.len();
        if n == 0 {
            return PerformanceSnapshot::default();
        }

        let count = n as f64;
        let total_r: f64 = r_values.iter().sum();
        let mean_r = total_r / count;

        let std_r = if n < 2 {
            0.0
        } else {
            let variance = r_values.iter().map(|r| (r - mean_r).powi(2)).sum::<f64>() / count;
            variance.sqrt()
        };

        let sqn = if std_r == 0.0 {
            0.0
        } else {
            count.sqrt() * mean_r / std_r
        };

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win_r = 0.0_f64;
        let mut largest_loss_r = 0.0_f64;

        for &r in r_values {
            if r > 0.0 {
                wins += 1;
                total_wins += r;
                largest_win_r = largest_win_r.max(r);
            } else if r < 0.0 {
                losses += 1;
                total_losses += r.abs();
                largest_loss_r = largest_loss_r.max(r.abs());
            }
        }

        let avg_win_r = if wins > 0 {
            total_wins / wins as f64
        } else {
            0.0
        };
        let avg_loss_r = if losses > 0 {
            total_losses / losses as f64
        } else {
            0.0
        };

        PerformanceSnapshot {
            trade_count: n,
            has_trades: true,
            win_rate: wins as f64 / count,
            mean_r,
            std_r,
            sqn,
            total_r,
            max_r_drawdown: max_r_drawdown(r_values),
            wins,
            losses,
            avg_win_r,
            avg_loss_r,
            largest_win_r,
            largest_loss_r,
        }
    }
}

/// Largest fall of cumulative R from its running peak. The peak starts at
/// the first cumulative value, not at zero.
fn max_r_drawdown(r_values: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &r in r_values {
        cumulative += r;
        peak = peak.max(cumulative);
        max_dd = max_dd.max(peak - cumulative);
    }

    max_dd
}

/// Append-only log of closed-trade R-multiples.
#[derive(Debug, Clone, Default)]
pub struct OutcomeTracker {
    records: Vec<RMultipleRecord>,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, timestamp: NaiveDateTime, r_value: f64) -> &RMultipleRecord {
        self.records.push(RMultipleRecord { timestamp, r_value });
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[RMultipleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn r_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.r_value).collect()
    }

    pub fn stats(&self) -> PerformanceSnapshot {
        PerformanceSnapshot::compute(&self.r_values())
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
