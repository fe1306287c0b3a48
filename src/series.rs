//! Historic price series from the charting endpoint.
//!
//! The response lists several series; the price series has an id starting
//! with `price:` and type `time`. Its `times` field is `START/RESOLUTION`
//! (e.g. `2021-01-04T00:00:00/PT1M`) and each data point is
//! `[offset, price]`, where `offset` counts resolution steps from `START`.

use chrono::{Months, NaiveDateTime, TimeDelta};
use serde_json::Value;

use crate::error::SeriesError;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One sample of a price series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub time: NaiveDateTime,
    pub price: f64,
}

/// A decoded price series.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub id: String,
    pub start: NaiveDateTime,
    pub resolution: String,
    pub points: Vec<PricePoint>,
}

/// Step between consecutive offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Fixed(TimeDelta),
    Months(u32),
}

impl Step {
    fn parse(code: &str) -> Option<Step> {
        let body = code.strip_prefix('P')?;
        if let Some(time) = body.strip_prefix('T') {
            let (n, unit) = split_unit(time)?;
            let n = i64::from(n);
            return match unit {
                'S' => Some(Step::Fixed(TimeDelta::seconds(n))),
                'M' => Some(Step::Fixed(TimeDelta::minutes(n))),
                'H' => Some(Step::Fixed(TimeDelta::hours(n))),
                _ => None,
            };
        }
        let (n, unit) = split_unit(body)?;
        match unit {
            'D' => Some(Step::Fixed(TimeDelta::days(i64::from(n)))),
            'W' => Some(Step::Fixed(TimeDelta::weeks(i64::from(n)))),
            'M' => Some(Step::Months(n)),
            'Y' => Some(Step::Months(n.checked_mul(12)?)),
            _ => None,
        }
    }

    fn advance(self, start: NaiveDateTime, offset: f64) -> Option<NaiveDateTime> {
        match self {
            Step::Fixed(delta) => {
                let secs = (delta.num_seconds() as f64 * offset).round() as i64;
                start.checked_add_signed(TimeDelta::try_seconds(secs)?)
            }
            Step::Months(n) => {
                if offset < 0.0 || offset.fract() != 0.0 {
                    return None;
                }
                let months = u32::try_from(offset as u64).ok()?.checked_mul(n)?;
                start.checked_add_months(Months::new(months))
            }
        }
    }
}

fn split_unit(s: &str) -> Option<(u32, char)> {
    let unit = s.chars().last()?;
    let n = s[..s.len() - unit.len_utf8()].parse().ok()?;
    Some((n, unit))
}

impl PriceSeries {
    /// Decode the price series out of a charting response.
    pub fn from_response(response: &Value) -> Result<Self, SeriesError> {
        let series = response
            .get("series")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|s| {
                s.get("type").and_then(Value::as_str) == Some("time")
                    && s.get("id")
                        .and_then(Value::as_str)
                        .is_some_and(|id| id.starts_with("price:"))
            })
            .ok_or(SeriesError::NoPriceSeries)?;

        let id = series
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let times = series
            .get("times")
            .and_then(Value::as_str)
            .ok_or_else(|| SeriesError::TimeCode(String::new()))?;
        let (start, resolution) = times
            .split_once('/')
            .ok_or_else(|| SeriesError::TimeCode(times.to_string()))?;
        let start = NaiveDateTime::parse_from_str(start, TIME_FORMAT)
            .map_err(|_| SeriesError::TimeCode(times.to_string()))?;
        let step = Step::parse(resolution).ok_or_else(|| SeriesError::TimeCode(times.to_string()))?;

        let mut points = Vec::new();
        let data = series.get("data").and_then(Value::as_array);
        for (index, point) in data.into_iter().flatten().enumerate() {
            let pair = point
                .as_array()
                .filter(|p| p.len() >= 2)
                .ok_or(SeriesError::Point {
                    index,
                    reason: "expected [offset, price]",
                })?;
            // Gaps in the feed are sent as null prices.
            let Some(price) = pair[1].as_f64() else {
                continue;
            };
            let offset = pair[0].as_f64().ok_or(SeriesError::Point {
                index,
                reason: "offset is not a number",
            })?;
            let time = step.advance(start, offset).ok_or(SeriesError::Point {
                index,
                reason: "offset out of range",
            })?;
            points.push(PricePoint { time, price });
        }

        Ok(PriceSeries {
            id,
            start,
            resolution: resolution.to_string(),
            points,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lowest price; the earliest one on ties.
    pub fn min(&self) -> Option<PricePoint> {
        self.points
            .iter()
            .copied()
            .reduce(|best, p| if p.price < best.price { p } else { best })
    }

    /// Highest price; the earliest one on ties.
    pub fn max(&self) -> Option<PricePoint> {
        self.points
            .iter()
            .copied()
            .reduce(|best, p| if p.price > best.price { p } else { best })
    }

    /// First and last sample times.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.points.first()?.time, self.points.last()?.time))
    }
}
