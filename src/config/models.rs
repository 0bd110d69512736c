// src/config/models.rs
use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Permission bits `chmod` accepts.
pub const MODE_MASK: u32 = 0o7777;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Listen spec, e.g. `8080`, `[::1]:443` or `unix:/run/app.sock`.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Mode for Unix socket files. Strings are read as octal.
    #[serde(default = "default_mode", deserialize_with = "deserialize_mode")]
    pub mode: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            mode: default_mode(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.listen.trim().is_empty() {
            bail!("listen address must not be empty");
        }
        if self.mode & !MODE_MASK != 0 {
            bail!("mode {:#o} has bits outside {:#o}", self.mode, MODE_MASK);
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "8080".to_string()
}

fn default_mode() -> u32 {
    0o660
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMode {
    Number(u32),
    Text(String),
}

fn deserialize_mode<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match RawMode::deserialize(deserializer)? {
        RawMode::Number(mode) => Ok(mode),
        RawMode::Text(text) => parse_octal_mode(&text).map_err(serde::de::Error::custom),
    }
}

/// Parses `0630`, `630` or `0o630` as an octal mode.
pub fn parse_octal_mode(text: &str) -> std::result::Result<u32, String> {
    let text = text.trim();
    let digits = text.strip_prefix("0o").unwrap_or(text);
    u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode {text:?}: {e}"))
}
