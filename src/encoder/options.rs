//! Encoder option strings

use crate::error::{AudioError, AudioResult};
use std::str::FromStr;

/// Keys every encoder accepts
pub const COMMON_OPTIONS: &[&str] = &["codec", "is_vbr", "bitrate", "quality"];

/// Parsed `key=value,key=value` option string
///
/// A bare key stands for `key=1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    values: Vec<(String, String)>,
}

impl Options {
    /// Parse `opts`, accepting only `recognized` keys and the common set
    pub fn parse(opts: &str, recognized: &[&str]) -> AudioResult<Self> {
        let mut values: Vec<(String, String)> = Vec::new();

        for item in opts.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = match item.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (item, "1"),
            };

            if !recognized.contains(&key) && !COMMON_OPTIONS.contains(&key) {
                return Err(AudioError::ConfigError(format!("Unknown option '{}'", key)));
            }
            if values.iter().any(|(k, _)| k == key) {
                return Err(AudioError::ConfigError(format!(
                    "Option '{}' given more than once",
                    key
                )));
            }

            values.push((key.to_string(), value.to_string()));
        }

        Ok(Options { values })
    }

    /// Raw value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse the value of `key` as `T`
    pub fn parse_value<T: FromStr>(&self, key: &str) -> AudioResult<Option<T>> {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    AudioError::ConfigError(format!("Invalid value '{}' for option '{}'", raw, key))
                })
            })
            .transpose()
    }

    /// Read a boolean switch (`1`/`0`, `true`/`false`, `yes`/`no`)
    pub fn flag(&self, key: &str) -> AudioResult<Option<bool>> {
        self.get(key)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                _ => Err(AudioError::ConfigError(format!(
                    "Invalid switch '{}' for option '{}'",
                    raw, key
                ))),
            })
            .transpose()
    }
}
