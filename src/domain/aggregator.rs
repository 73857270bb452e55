//! Bar aggregator - resamples a fine bar stream into coarser buckets.
//!
//! Buckets are `multiple * interval_secs` long and aligned to the Unix epoch,
//! so 5-minute buckets start on the hour. A bucket is emitted when the first
//! bar at or past its end arrives; a bar landing exactly on a boundary opens
//! the next bucket.

use chrono::{Duration, NaiveDateTime};

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, PartialEq)]
struct OpenBucket {
    start: NaiveDateTime,
    end: NaiveDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl OpenBucket {
    fn to_bar(&self) -> Bar {
        Bar {
            timestamp: self.start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BarAggregator {
    bucket_secs: i64,
    current: Option<OpenBucket>,
}

impl BarAggregator {
    pub fn new(interval_secs: u32, multiple: u32) -> Self {
        let bucket_secs = (i64::from(interval_secs) * i64::from(multiple)).max(1);
        Self {
            bucket_secs,
            current: None,
        }
    }

    pub fn bucket_secs(&self) -> i64 {
        self.bucket_secs
    }

    pub fn is_building(&self) -> bool {
        self.current.is_some()
    }

    /// Feed one bar. Returns the completed bucket when this bar starts a new one.
    pub fn update(&mut self, bar: &Bar) -> Option<Bar> {
        let completed = match self.current.take() {
            Some(bucket) if bar.timestamp >= bucket.end => Some(bucket.to_bar()),
            open => {
                self.current = open;
                None
            }
        };

        match self.current.as_mut() {
            Some(bucket) => {
                bucket.high = bucket.high.max(bar.high);
                bucket.low = bucket.low.min(bar.low);
                bucket.close = bar.close;
                bucket.volume += bar.volume;
            }
            None => self.current = Some(self.start_bucket(bar)),
        }

        completed
    }

    /// Emit the partially filled bucket, if any, and clear it.
    pub fn flush(&mut self) -> Option<Bar> {
        self.current.take().map(|bucket| bucket.to_bar())
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    fn start_bucket(&self, bar: &Bar) -> OpenBucket {
        let secs = bar.timestamp.and_utc().timestamp();
        let offset = secs.rem_euclid(self.bucket_secs);
        let start = bar.timestamp - Duration::seconds(offset);
        OpenBucket {
            start,
            end: start + Duration::seconds(self.bucket_secs),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}
