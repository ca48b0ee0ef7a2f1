//! Severity levels.
//!
//! Levels are totally ordered by severity; `None` sits above `Critical` and
//! is used as a configured minimum to switch a sink off entirely.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Critical,
    None,
}

impl LogLevel {
    /// All levels, least severe first.
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Critical,
        LogLevel::None,
    ];

    /// Numeric severity rank (trace = 0 .. none = 6).
    pub fn severity(self) -> u8 {
        self as u8
    }

    /// Returns true if a record at `self` passes a configured `minimum`.
    pub fn passes(self, minimum: LogLevel) -> bool {
        self != LogLevel::None && minimum != LogLevel::None && self >= minimum
    }

    /// Short console tag.
    pub fn tag(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRC",
            LogLevel::Debug => "DBG",
            LogLevel::Info => "INF",
            LogLevel::Warn => "WRN",
            LogLevel::Error => "ERR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::None => "",
        }
    }

    /// Name used on the wire by the remote collectors.
    pub fn display_name(self) -> &'static str {
        match self {
            LogLevel::Trace => "Trace",
            LogLevel::Debug => "Debug",
            LogLevel::Info => "Information",
            LogLevel::Warn => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Critical => "Critical",
            LogLevel::None => "None",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl From<LogLevel> for &'static str {
    fn from(level: LogLevel) -> Self {
        level.display_name()
    }
}

/// Error returned when parsing an unknown level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" | "verbose" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" | "information" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "critical" | "fatal" => Ok(LogLevel::Critical),
            "none" | "off" => Ok(LogLevel::None),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ParseLevelError;

    fn try_from(value: String) -> Result<Self, ParseLevelError> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_matches_severity_rank() {
        for minimum in LogLevel::ALL {
            for requested in LogLevel::ALL {
                let expected = requested != LogLevel::None
                    && minimum != LogLevel::None
                    && requested.severity() >= minimum.severity();
                assert_eq!(
                    requested.passes(minimum),
                    expected,
                    "requested {:?} against minimum {:?}",
                    requested,
                    minimum
                );
            }
        }
    }

    #[test]
    fn test_none_never_passes() {
        assert!(!LogLevel::None.passes(LogLevel::Trace));
        assert!(!LogLevel::Critical.passes(LogLevel::None));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Information".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::None);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
