//! Fixed-interval resampling of a bar series (e.g. hourly to 45-minute).
//!
//! Buckets are anchored at midnight of the first bar's day and advance in
//! steps of the interval across day boundaries. Each bucket aggregates as
//! open = first, high = max, low = min, close = last, volume = sum.
//! NaN prices are skipped by every aggregate; a bucket whose field is NaN
//! throughout keeps NaN. Buckets with no bars are not emitted.

use crate::domain::PriceBar;
use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResampleError {
    #[error("resample interval must be positive, got {0} ms")]
    NonPositiveInterval(i64),
}

/// Resample `bars` (timestamp order) into buckets of `interval`.
pub fn resample(bars: &[PriceBar], interval: Duration) -> Result<Vec<PriceBar>, ResampleError> {
    let step = interval.num_milliseconds();
    if step <= 0 {
        return Err(ResampleError::NonPositiveInterval(step));
    }
    let Some(first) = bars.first() else {
        return Ok(Vec::new());
    };

    let origin = first.timestamp.date().and_time(chrono::NaiveTime::MIN);
    let bucket_of = |ts: NaiveDateTime| (ts - origin).num_milliseconds().div_euclid(step);

    let mut out: Vec<PriceBar> = Vec::new();
    let mut current: Option<i64> = None;
    for bar in bars {
        let bucket = bucket_of(bar.timestamp);
        match out.last_mut() {
            Some(agg) if current == Some(bucket) => merge(agg, bar),
            _ => {
                current = Some(bucket);
                let mut agg = bar.clone();
                agg.timestamp = origin + Duration::milliseconds(bucket * step);
                out.push(agg);
            }
        }
    }

    tracing::debug!(
        input = bars.len(),
        output = out.len(),
        interval_ms = step,
        "bars resampled"
    );
    Ok(out)
}

fn merge(agg: &mut PriceBar, bar: &PriceBar) {
    if agg.open.is_nan() {
        agg.open = bar.open;
    }
    agg.high = agg.high.max(bar.high);
    agg.low = agg.low.min(bar.low);
    if !bar.close.is_nan() {
        agg.close = bar.close;
    }
    if !bar.volume.is_nan() {
        agg.volume = if agg.volume.is_nan() {
            bar.volume
        } else {
            agg.volume + bar.volume
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar_at(h: u32, m: u32, o: f64, hi: f64, lo: f64, c: f64) -> PriceBar {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap();
        PriceBar::new(ts, o, hi, lo, c).with_volume(1.0)
    }

    #[test]
    fn hourly_into_two_hour_buckets() {
        let bars = vec![
            bar_at(0, 0, 1.10, 1.12, 1.09, 1.11),
            bar_at(1, 0, 1.11, 1.15, 1.10, 1.14),
            bar_at(2, 0, 1.14, 1.14, 1.05, 1.06),
        ];
        let out = resample(&bars, Duration::hours(2)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, bars[0].timestamp);
        assert_eq!(out[0].open, 1.10);
        assert_eq!(out[0].high, 1.15);
        assert_eq!(out[0].low, 1.09);
        assert_eq!(out[0].close, 1.14);
        assert_eq!(out[0].volume, 2.0);
        assert_eq!(out[1].timestamp, bars[2].timestamp);
        assert_eq!(out[1].close, 1.06);
    }

    #[test]
    fn forty_five_minute_buckets_anchor_at_midnight() {
        let bars = vec![
            bar_at(0, 30, 1.0, 1.0, 1.0, 1.0),
            bar_at(1, 0, 1.0, 1.0, 1.0, 1.0),
            bar_at(1, 30, 1.0, 1.0, 1.0, 1.0),
        ];
        let out = resample(&bars, Duration::minutes(45)).unwrap();
        // buckets: 00:00, 00:45, 01:30
        let times: Vec<_> = out.iter().map(|b| b.timestamp.time().to_string()).collect();
        assert_eq!(times, ["00:00:00", "00:45:00", "01:30:00"]);
    }

    #[test]
    fn empty_buckets_are_skipped() {
        let bars = vec![
            bar_at(0, 0, 1.0, 1.0, 1.0, 1.0),
            bar_at(5, 0, 1.0, 1.0, 1.0, 1.0),
        ];
        let out = resample(&bars, Duration::hours(1)).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn nan_fields_are_skipped() {
        let bars = vec![
            bar_at(0, 0, f64::NAN, 1.2, f64::NAN, 1.1),
            bar_at(0, 30, 1.1, f64::NAN, 1.0, f64::NAN),
        ];
        let out = resample(&bars, Duration::hours(1)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].open, 1.1);
        assert_eq!(out[0].high, 1.2);
        assert_eq!(out[0].low, 1.0);
        assert_eq!(out[0].close, 1.1);
    }

    #[test]
    fn rejects_non_positive_interval() {
        assert!(resample(&[], Duration::zero()).is_err());
        assert!(resample(&[], Duration::minutes(-5)).is_err());
        assert!(resample(&[], Duration::minutes(5)).unwrap().is_empty());
    }
}
