//! Historic price periods.

use std::fmt;
use std::str::FromStr;

/// Period covered by a historic price query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Day,
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
    ThreeYears,
    FiveYears,
    /// Fifty years, i.e. the full history.
    All,
}

impl Interval {
    pub const ALL: [Interval; 9] = [
        Interval::Day,
        Interval::Week,
        Interval::Month,
        Interval::ThreeMonths,
        Interval::SixMonths,
        Interval::Year,
        Interval::ThreeYears,
        Interval::FiveYears,
        Interval::All,
    ];

    /// ISO-8601 duration code sent as `period`.
    pub fn code(self) -> &'static str {
        match self {
            Interval::Day => "P1D",
            Interval::Week => "P1W",
            Interval::Month => "P1M",
            Interval::ThreeMonths => "P3M",
            Interval::SixMonths => "P6M",
            Interval::Year => "P1Y",
            Interval::ThreeYears => "P3Y",
            Interval::FiveYears => "P5Y",
            Interval::All => "P50Y",
        }
    }

    /// Sampling resolution requested for this period.
    pub fn resolution(self) -> &'static str {
        match self {
            Interval::Day => "PT1M",
            Interval::Week => "PT15M",
            Interval::Month => "PT1H",
            Interval::ThreeMonths | Interval::SixMonths | Interval::Year => "P1D",
            Interval::ThreeYears | Interval::FiveYears => "P7D",
            Interval::All => "P1M",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Interval::Day => "day",
            Interval::Week => "week",
            Interval::Month => "month",
            Interval::ThreeMonths => "3m",
            Interval::SixMonths => "6m",
            Interval::Year => "year",
            Interval::ThreeYears => "3y",
            Interval::FiveYears => "5y",
            Interval::All => "all",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown interval `{0}` (expected day, week, month, 3m, 6m, year, 3y, 5y, all)")]
pub struct ParseIntervalError(pub String);

impl FromStr for Interval {
    type Err = ParseIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let alias = match lower.as_str() {
            "three_months" | "3months" => Some(Interval::ThreeMonths),
            "six_months" | "6months" => Some(Interval::SixMonths),
            "three_years" | "3years" => Some(Interval::ThreeYears),
            "five_years" | "5years" => Some(Interval::FiveYears),
            "1y" => Some(Interval::Year),
            _ => None,
        };
        alias
            .or_else(|| {
                Interval::ALL
                    .into_iter()
                    .find(|i| i.name() == lower || i.code().eq_ignore_ascii_case(&lower))
            })
            .ok_or_else(|| ParseIntervalError(s.to_string()))
    }
}
