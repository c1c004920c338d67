//! Reducers over matrix query results

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

use super::{MatrixSeries, StatsError};

/// Point counts per series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesPointStats {
    pub series: usize,
    pub total_points: usize,
    pub min_points: usize,
    pub max_points: usize,
}

/// Wall-clock span covered by the returned samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageStats {
    pub has_points: bool,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub observed_duration: Duration,
}

/// Arithmetic mean of every usable value across all series
///
/// Returns the mean and the number of values that contributed to it.
pub fn average_series_value(series: &[MatrixSeries]) -> Result<(f64, usize), StatsError> {
    let (sum, count) = series
        .iter()
        .flat_map(MatrixSeries::values)
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        return Err(StatsError::NoDataPoints);
    }

    Ok((sum / count as f64, count))
}

/// Count raw samples per series
pub fn series_point_stats(series: &[MatrixSeries]) -> SeriesPointStats {
    if series.is_empty() {
        return SeriesPointStats::default();
    }

    let counts = series.iter().map(|s| s.samples.len());
    SeriesPointStats {
        series: series.len(),
        total_points: counts.clone().sum(),
        min_points: counts.clone().min().unwrap_or(0),
        max_points: counts.max().unwrap_or(0),
    }
}

/// Earliest and latest timestamps across all series
pub fn coverage_stats(series: &[MatrixSeries]) -> CoverageStats {
    let mut bounds: Option<(i64, i64)> = None;
    for ts in series.iter().flat_map(MatrixSeries::timestamps) {
        bounds = Some(match bounds {
            None => (ts, ts),
            Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
        });
    }

    let Some((earliest, latest)) = bounds else {
        return CoverageStats::default();
    };

    CoverageStats {
        has_points: true,
        earliest: Utc.timestamp_opt(earliest, 0).single(),
        latest: Utc.timestamp_opt(latest, 0).single(),
        observed_duration: Duration::from_secs(latest.saturating_sub(earliest).max(0) as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TimeSeriesPoint;
    use serde_json::json;

    #[test]
    fn test_average_of_two_points() {
        let series = vec![MatrixSeries::from_samples([(1_700_000_000, "1.0"), (1_700_000_300, "3.0")])];
        let (avg, count) = average_series_value(&series).unwrap();
        assert_eq!(avg, 2.0);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_average_spans_series() {
        let series = vec![
            MatrixSeries::from_samples([(1, "2")]),
            MatrixSeries::from_samples([(1, "4"), (2, "6")]),
        ];
        let (avg, count) = average_series_value(&series).unwrap();
        assert_eq!(avg, 4.0);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_average_skips_non_numeric_values() {
        let series = vec![MatrixSeries {
            samples: vec![
                vec![json!(1), json!("5.0")],
                vec![json!(2), json!(7.0)],
                vec![json!(3), json!("abc")],
                vec![json!(4)],
            ],
            ..Default::default()
        }];
        let (avg, count) = average_series_value(&series).unwrap();
        assert_eq!(avg, 5.0);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_average_empty_is_no_data() {
        assert!(matches!(average_series_value(&[]), Err(StatsError::NoDataPoints)));
        let only_garbage = vec![MatrixSeries::from_samples([(1, "n/a")])];
        assert!(matches!(
            average_series_value(&only_garbage),
            Err(StatsError::NoDataPoints)
        ));
    }

    #[test]
    fn test_points_need_timestamp_and_value() {
        let series = MatrixSeries {
            samples: vec![
                vec![json!(1_700_000_000), json!("0.25")],
                vec![json!("later"), json!("1.0")],
                vec![json!(1_700_000_300), json!("NaN?")],
            ],
            ..Default::default()
        };
        let points: Vec<TimeSeriesPoint> = series.points().collect();
        assert_eq!(
            points,
            vec![TimeSeriesPoint {
                timestamp_unix: 1_700_000_000,
                value: 0.25,
            }]
        );
    }

    #[test]
    fn test_point_stats() {
        let series = vec![
            MatrixSeries::from_samples([(1, "1"), (2, "1"), (3, "1")]),
            MatrixSeries::from_samples([(1, "1")]),
        ];
        let stats = series_point_stats(&series);
        assert_eq!(
            stats,
            SeriesPointStats {
                series: 2,
                total_points: 4,
                min_points: 1,
                max_points: 3,
            }
        );
        assert_eq!(series_point_stats(&[]), SeriesPointStats::default());
    }

    #[test]
    fn test_coverage_spans_all_series() {
        let series = vec![
            MatrixSeries::from_samples([(1_700_000_600, "1"), (1_700_003_600, "1")]),
            MatrixSeries::from_samples([(1_700_000_000, "1")]),
        ];
        let coverage = coverage_stats(&series);
        assert!(coverage.has_points);
        assert_eq!(coverage.earliest.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(coverage.latest.unwrap().timestamp(), 1_700_003_600);
        assert_eq!(coverage.observed_duration, Duration::from_secs(3600));
    }

    #[test]
    fn test_coverage_single_point_has_zero_span() {
        let coverage = coverage_stats(&[MatrixSeries::from_samples([(1_700_000_000, "1")])]);
        assert!(coverage.has_points);
        assert_eq!(coverage.observed_duration, Duration::ZERO);
    }

    #[test]
    fn test_coverage_empty_defaults() {
        let coverage = coverage_stats(&[MatrixSeries::default()]);
        assert!(!coverage.has_points);
        assert!(coverage.earliest.is_none());
        assert_eq!(coverage.observed_duration, Duration::ZERO);
    }
}
