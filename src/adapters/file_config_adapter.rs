//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive. Numeric getters fall back to
//! the caller's default only when a key is missing or blank; a value that does
//! not parse is a `ConfigInvalid` error. Range checks live in
//! `domain::config_validation`.

use crate::domain::error::SmacrossError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SmacrossError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| SmacrossError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SmacrossError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SmacrossError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    fn parse_value<T>(&self, section: &str, key: &str, kind: &str) -> Result<Option<T>, SmacrossError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(raw) = self.get_non_empty(section, key) else {
            return Ok(None);
        };
        raw.parse::<T>()
            .map(Some)
            .map_err(|e| SmacrossError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{}' is not {}: {}", raw, kind, e),
            })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SmacrossError> {
        Ok(self
            .parse_value(section, key, "an integer")?
            .unwrap_or(default))
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SmacrossError> {
        Ok(self
            .parse_value(section, key, "a number")?
            .unwrap_or(default))
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|v| Self::parse_bool(&v))
            .unwrap_or(default)
    }
}
