//! Config file loading for CLI defaults.
//!
//! The file is a flat list of `key = value` lines. Strings are double-quoted,
//! integers are bare, and `#` starts a comment outside a string.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Values read from the config file. Unset keys fall back to built-in
/// defaults; command-line flags override both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FileConfig {
    /// Directory runs are synced into.
    pub base_dir: Option<PathBuf>,
    /// Newest runs examined by `sync`.
    pub max_runs: Option<u16>,
    /// Simultaneous dataset downloads.
    pub max_downloads: Option<u8>,
    /// Attempts per request and per dataset.
    pub max_retries: Option<u32>,
    /// Pause between attempts, in seconds.
    pub retry_sleep_secs: Option<u64>,
    /// Deadline for one byte-range request, in seconds.
    pub fetch_timeout_secs: Option<u64>,
    /// wgrib2 program.
    pub wgrib2: Option<String>,
}

impl FileConfig {
    /// Validates values against the ranges the CLI accepts.
    pub fn validate(&self) -> Result<()> {
        check_range("max_runs", self.max_runs.map(u64::from), 1, 50)?;
        check_range("max_downloads", self.max_downloads.map(u64::from), 1, 32)?;
        check_range("max_retries", self.max_retries.map(u64::from), 1, 20)?;
        check_range("retry_sleep_secs", self.retry_sleep_secs, 0, 3600)?;
        check_range("fetch_timeout_secs", self.fetch_timeout_secs, 1, 86_400)?;
        if self.wgrib2.as_deref().is_some_and(str::is_empty) {
            bail!("Invalid config value for `wgrib2`: expected a program name or path");
        }
        Ok(())
    }
}

fn check_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/aonui/config.toml`
/// 2. `$HOME/.config/aonui/config.toml`
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("aonui").join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(PathBuf::from(home).join(".config").join("aonui").join("config.toml"))
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads `explicit` if given (it must exist), otherwise the default config
/// file if there is one.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return load_file_config(path);
    }

    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw).with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

pub(crate) fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "base_dir" => {
                cfg.base_dir = Some(PathBuf::from(parse_string_literal(value).with_context(context)?));
            }
            "wgrib2" => {
                cfg.wgrib2 = Some(parse_string_literal(value).with_context(context)?);
            }
            "max_runs" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                cfg.max_runs = Some(u16::try_from(parsed).with_context(context)?);
            }
            "max_downloads" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                cfg.max_downloads = Some(u8::try_from(parsed).with_context(context)?);
            }
            "max_retries" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                cfg.max_retries = Some(u32::try_from(parsed).with_context(context)?);
            }
            "retry_sleep_secs" => {
                cfg.retry_sleep_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "fetch_timeout_secs" => {
                cfg.fetch_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
