use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;

use crate::{core::error::Error, quantity::rate::SpotRate};

pub const HOURS_PER_DAY: usize = 24;

/// One hour of the day-ahead price curve.
#[derive(Copy, Clone, Debug)]
pub struct PricePoint {
    pub start_at: DateTime<Utc>,

    /// `None` when the feed has not published the hour yet (the feed marks
    /// this with an infinity sentinel, which never makes it past the client).
    pub value: Option<SpotRate>,
}

/// Hourly prices for one calendar day in one price area.
///
/// Either available (exactly [`HOURS_PER_DAY`] contiguous, ascending,
/// concrete points) or unavailable as a whole. Anything in between is a feed
/// contract violation and is rejected at construction.
#[derive(Debug)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// The day the feed has not published yet.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self { points: Vec::new() }
    }

    pub fn try_from_points(points: Vec<PricePoint>) -> Result<Self, Error> {
        if points.first().is_none_or(|first| first.value.is_none()) {
            return Ok(Self::unavailable());
        }
        if points.len() != HOURS_PER_DAY
            || points.iter().any(|point| point.value.is_none())
            || points
                .iter()
                .tuple_windows()
                .any(|(this, next)| next.start_at - this.start_at != TimeDelta::hours(1))
        {
            return Err(Error::DataUnavailable);
        }
        Ok(Self { points })
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.points.first().is_some_and(|first| first.value.is_some())
    }

    /// Midnight's rate: the night at the start of this day.
    #[must_use]
    pub fn first_value(&self) -> Option<SpotRate> {
        self.points.first().and_then(|point| point.value)
    }

    /// The 23:00 rate: the night at the end of this day.
    #[must_use]
    pub fn last_value(&self) -> Option<SpotRate> {
        self.points.last().and_then(|point| point.value)
    }

    #[must_use]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }
}

#[cfg(test)]
pub mod tests {
    use chrono::TimeZone;

    use super::*;

    /// Build an available series from 24 concrete values.
    pub fn series_from(values: [f64; HOURS_PER_DAY]) -> PriceSeries {
        PriceSeries::try_from_points(points_from(values.map(Some))).unwrap()
    }

    pub fn points_from<const N: usize>(values: [Option<f64>; N]) -> Vec<PricePoint> {
        let midnight = Utc.with_ymd_and_hms(2026, 1, 15, 23, 0, 0).unwrap();
        values
            .into_iter()
            .enumerate()
            .map(|(hour, value)| PricePoint {
                start_at: midnight + TimeDelta::hours(hour as i64),
                value: value.map(SpotRate),
            })
            .collect()
    }

    #[test]
    fn test_full_day_is_available() {
        let series = series_from([100.0; HOURS_PER_DAY]);
        assert!(series.is_available());
        assert_eq!(series.first_value(), Some(SpotRate(100.0)));
        assert_eq!(series.last_value(), Some(SpotRate(100.0)));
    }

    #[test]
    fn test_sentinel_first_point_means_unavailable() {
        let mut values = [Some(100.0); HOURS_PER_DAY];
        values[0] = None;
        let series = PriceSeries::try_from_points(points_from(values)).unwrap();
        assert!(!series.is_available());
        assert_eq!(series.last_value(), None);
    }

    #[test]
    fn test_empty_series_is_unavailable() {
        assert!(!PriceSeries::try_from_points(Vec::new()).unwrap().is_available());
    }

    #[test]
    fn test_short_day_is_rejected() {
        let result = PriceSeries::try_from_points(points_from([Some(100.0); 23]));
        assert!(matches!(result, Err(Error::DataUnavailable)));
    }

    #[test]
    fn test_gap_in_the_middle_is_rejected() {
        let mut values = [Some(100.0); HOURS_PER_DAY];
        values[12] = None;
        let result = PriceSeries::try_from_points(points_from(values));
        assert!(matches!(result, Err(Error::DataUnavailable)));
    }

    #[test]
    fn test_non_contiguous_hours_are_rejected() {
        let mut points = points_from([Some(100.0); HOURS_PER_DAY]);
        points[7].start_at += TimeDelta::minutes(30);
        let result = PriceSeries::try_from_points(points);
        assert!(matches!(result, Err(Error::DataUnavailable)));
    }
}
