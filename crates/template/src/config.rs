//! Engine configuration and time source

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Engine options, deserializable from camelCase JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Try filling the background's own form fields before overlaying
    pub native_fill: bool,

    /// Flate-compress rendered content streams
    pub compress_streams: bool,

    /// chrono format string for the standalone header timestamp
    pub timestamp_format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            native_fill: true,
            compress_streams: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

/// Source of the standalone header timestamp
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_config_from_partial_json() {
        let config: EngineConfig = serde_json::from_str(r#"{ "nativeFill": false }"#).unwrap();
        assert!(!config.native_fill);
        assert!(config.compress_streams);
        assert_eq!(config.timestamp_format, "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn test_fixed_clock() {
        let instant = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now().format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 09:30");
    }
}
