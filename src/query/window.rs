//! Lookback windows and bucket steps accepted by series queries

use crate::Error;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Total lookback of a series query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Window {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[default]
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
}

impl Window {
    pub const ALL: [Window; 5] = [
        Window::OneHour,
        Window::SixHours,
        Window::TwelveHours,
        Window::OneDay,
        Window::SevenDays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Window::OneHour => "1h",
            Window::SixHours => "6h",
            Window::TwelveHours => "12h",
            Window::OneDay => "24h",
            Window::SevenDays => "7d",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Window::OneHour => Duration::hours(1),
            Window::SixHours => Duration::hours(6),
            Window::TwelveHours => Duration::hours(12),
            Window::OneDay => Duration::hours(24),
            Window::SevenDays => Duration::days(7),
        }
    }
}

/// Width of each bucket within a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Step {
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "24h")]
    OneDay,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::FifteenMinutes,
        Step::ThirtyMinutes,
        Step::OneHour,
        Step::TwoHours,
        Step::FourHours,
        Step::OneDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::FifteenMinutes => "15m",
            Step::ThirtyMinutes => "30m",
            Step::OneHour => "1h",
            Step::TwoHours => "2h",
            Step::FourHours => "4h",
            Step::OneDay => "24h",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Step::FifteenMinutes => Duration::minutes(15),
            Step::ThirtyMinutes => Duration::minutes(30),
            Step::OneHour => Duration::hours(1),
            Step::TwoHours => Duration::hours(2),
            Step::FourHours => Duration::hours(4),
            Step::OneDay => Duration::hours(24),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Window {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Window::ALL
            .into_iter()
            .find(|w| w.as_str() == value.trim())
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown window '{}'; expected one of 1h, 6h, 12h, 24h, 7d",
                    value
                ))
            })
    }
}

impl FromStr for Step {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .into_iter()
            .find(|s| s.as_str() == value.trim())
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown step '{}'; expected one of 15m, 30m, 1h, 2h, 4h, 24h",
                    value
                ))
            })
    }
}
