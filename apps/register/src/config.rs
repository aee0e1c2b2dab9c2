//! # Register Configuration
//!
//! Settings loaded once at startup from `COMANDA_*` environment variables,
//! falling back to defaults.
//!
//! ## Variables
//! ```text
//! COMANDA_DB_PATH              database file      (platform data dir)
//! COMANDA_STORE_NAME           report header      "Comanda"
//! COMANDA_CURRENCY_SYMBOL      display symbol     "$"
//! COMANDA_CURRENCY_DECIMALS    minor digits       0 (whole pesos)
//! COMANDA_UTC_OFFSET_MINUTES   calendar day edge  -180
//! COMANDA_DEFAULT_FLOAT        suggested float    20000
//! ```
//!
//! Read-only after initialization.

use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use directories::ProjectDirs;
use serde::Serialize;
use thiserror::Error;

use comanda_core::{Money, DEFAULT_OPENING_FLOAT};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    /// No override and no platform data directory.
    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Could not create data directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Register configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterConfig {
    /// Explicit database path; `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Store name (printed on reports)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Offset used to decide which calendar day a timestamp falls on.
    pub utc_offset_minutes: i32,

    /// Opening float suggested to the operator.
    pub default_float: Money,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        RegisterConfig {
            database_path: None,
            store_name: "Comanda".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 0,
            utc_offset_minutes: -180,
            default_float: Money::from_minor(DEFAULT_OPENING_FLOAT),
        }
    }
}

impl RegisterConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = RegisterConfig::default();

        if let Some(path) = lookup("COMANDA_DB_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup("COMANDA_STORE_NAME") {
            config.store_name = name;
        }

        if let Some(symbol) = lookup("COMANDA_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(raw) = lookup("COMANDA_CURRENCY_DECIMALS") {
            config.currency_decimals = parse_var("COMANDA_CURRENCY_DECIMALS", &raw)?;
            if config.currency_decimals > 4 {
                return Err(ConfigError::InvalidValue("COMANDA_CURRENCY_DECIMALS".to_string()));
            }
        }

        if let Some(raw) = lookup("COMANDA_UTC_OFFSET_MINUTES") {
            config.utc_offset_minutes = parse_var("COMANDA_UTC_OFFSET_MINUTES", &raw)?;
            // Validate now so utc_offset() cannot fail later.
            offset_from_minutes(config.utc_offset_minutes)
                .ok_or_else(|| ConfigError::InvalidValue("COMANDA_UTC_OFFSET_MINUTES".to_string()))?;
        }

        if let Some(raw) = lookup("COMANDA_DEFAULT_FLOAT") {
            let float: i64 = parse_var("COMANDA_DEFAULT_FLOAT", &raw)?;
            if float < 0 {
                return Err(ConfigError::InvalidValue("COMANDA_DEFAULT_FLOAT".to_string()));
            }
            config.default_float = Money::from_minor(float);
        }

        Ok(config)
    }

    /// Offset for calendar-day boundaries. Out-of-range values fall back to UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }

    /// Database file path.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/cl.comanda.register/comanda.db`
    /// - **Windows**: `%APPDATA%\comanda\register\data\comanda.db`
    /// - **Linux**: `~/.local/share/register/comanda.db`
    ///
    /// The data directory is created when missing.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("cl", "comanda", "register").ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("comanda.db"))
    }

    /// Formats an amount in minor units.
    ///
    /// Thousands are separated with `.`, decimals with `,`.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = RegisterConfig::default();
    /// assert_eq!(config.format_currency(Money::from_minor(1234567)), "$1.234.567");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let minor = amount.minor();
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = (minor / divisor).unsigned_abs();
        let frac = (minor % divisor).unsigned_abs();

        format!(
            "{}{}{}",
            if minor < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{},{:0width$}",
                    group_thousands(whole),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                group_thousands(whole)
            }
        )
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RegisterConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.currency_decimals, 0);
        assert_eq!(config.default_float.minor(), 20_000);
        assert_eq!(config.utc_offset().local_minus_utc(), -3 * 3600);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = RegisterConfig::from_lookup(lookup(&[
            ("COMANDA_DB_PATH", "/tmp/comanda.db"),
            ("COMANDA_STORE_NAME", "Sushi Bar"),
            ("COMANDA_UTC_OFFSET_MINUTES", "-240"),
            ("COMANDA_DEFAULT_FLOAT", "50000"),
        ]))
        .unwrap();

        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/comanda.db"));
        assert_eq!(config.store_name, "Sushi Bar");
        assert_eq!(config.utc_offset().local_minus_utc(), -4 * 3600);
        assert_eq!(config.default_float.minor(), 50_000);
    }

    #[test]
    fn test_invalid_values() {
        for (name, value) in [
            ("COMANDA_CURRENCY_DECIMALS", "two"),
            ("COMANDA_CURRENCY_DECIMALS", "9"),
            ("COMANDA_UTC_OFFSET_MINUTES", "100000"),
            ("COMANDA_DEFAULT_FLOAT", "-1"),
        ] {
            let err = RegisterConfig::from_lookup(lookup(&[(name, value)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(ref n) if n == name));
        }
    }

    #[test]
    fn test_format_currency_whole_pesos() {
        let config = RegisterConfig::default();
        assert_eq!(config.format_currency(Money::from_minor(0)), "$0");
        assert_eq!(config.format_currency(Money::from_minor(1800)), "$1.800");
        assert_eq!(config.format_currency(Money::from_minor(1234567)), "$1.234.567");
        assert_eq!(config.format_currency(Money::from_minor(-25000)), "-$25.000");
    }

    #[test]
    fn test_format_currency_with_decimals() {
        let config = RegisterConfig {
            currency_decimals: 2,
            ..RegisterConfig::default()
        };
        assert_eq!(config.format_currency(Money::from_minor(123456)), "$1.234,56");
        assert_eq!(config.format_currency(Money::from_minor(5)), "$0,05");
        assert_eq!(config.format_currency(Money::from_minor(-1234)), "-$12,34");
    }
}
