//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::target::OffsetType;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [simulator] section
    if let Some(section) = ini.section(Some("simulator")) {
        let s = Section::new("simulator", section);
        if let Some(v) = section.get("enabled") {
            config.simulator.enabled = parse_bool(v);
        }
        if let Some(port) = s.parse::<u16>("port", "must be a UDP port number (1-65535)")? {
            if port == 0 {
                return Err(s.invalid("port", "0", "must be a UDP port number (1-65535)"));
            }
            config.simulator.port = port;
        }
        if let Some(v) = s.positive("priority_timeout_secs", "must be a positive number (seconds)")? {
            config.simulator.priority_timeout_secs = v;
        }
        if let Some(v) = s.interval_ms("resample_interval_ms")? {
            config.simulator.resample_interval_ms = v;
        }
    }

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        let s = Section::new("location", section);
        if let Some(v) = s.non_negative("max_extrapolation_secs", "must be zero or a positive number (seconds)")? {
            config.location.max_extrapolation_secs = v;
        }
        if let Some(v) = s.interval_ms("resample_interval_ms")? {
            config.location.resample_interval_ms = v;
        }
    }

    // [guidance] section
    if let Some(section) = ini.section(Some("guidance")) {
        let s = Section::new("guidance", section);
        if let Some(v) = s.non_negative("min_moving_speed_kt", "must be zero or a positive number (knots)")? {
            config.guidance.min_moving_speed_kt = v;
        }
        if let Some(v) = s.non_negative("close_to_ip_secs", "must be zero or a positive number (seconds)")? {
            config.guidance.close_to_ip_secs = v;
        }
        if let Some(v) = s.positive("on_time_window_secs", "must be a positive number (seconds)")? {
            config.guidance.on_time_window_secs = v;
        }
        if let Some(v) = s.positive("caution_multiplier", "must be a positive number")? {
            config.guidance.caution_multiplier = v;
        }
        if let Some(v) = s.non_negative("max_speed_change_percent", "must be a percentage from 0 to 100")? {
            if v > 100.0 {
                return Err(s.invalid(
                    "max_speed_change_percent",
                    &v.to_string(),
                    "must be a percentage from 0 to 100",
                ));
            }
            config.guidance.max_speed_change_percent = v;
        }
    }

    // [target] section
    if let Some(section) = ini.section(Some("target")) {
        let s = Section::new("target", section);
        if let Some(v) = s.positive("default_ground_speed_kt", "must be a positive number (knots)")? {
            config.target.default_ground_speed_kt = v;
        }
        if let Some(v) = s.parse::<OffsetType>("default_offset_type", "must be 'distance' or 'time'")? {
            config.target.default_offset_type = v;
        }
        if let Some(v) = s.non_negative("default_offset", "must be zero or a positive number (NM or minutes)")? {
            config.target.default_offset = v;
        }
    }

    // [magnetic] section
    if let Some(section) = ini.section(Some("magnetic")) {
        if let Some(v) = section.get("coefficients_file") {
            let v = v.trim();
            if !v.is_empty() {
                config.magnetic.coefficients_file = Some(expand_tilde(v));
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

/// One INI section with typed accessors that report `InvalidValue`.
struct Section<'a> {
    name: &'static str,
    properties: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, properties: &'a Properties) -> Self {
        Self { name, properties }
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse<T: FromStr>(&self, key: &str, reason: &str) -> Result<Option<T>, ConfigFileError> {
        self.properties
            .get(key)
            .map(|v| v.trim().parse().map_err(|_| self.invalid(key, v, reason)))
            .transpose()
    }

    fn float(
        &self,
        key: &str,
        reason: &str,
        accept: impl Fn(f64) -> bool,
    ) -> Result<Option<f64>, ConfigFileError> {
        match self.parse::<f64>(key, reason)? {
            Some(v) if v.is_finite() && accept(v) => Ok(Some(v)),
            Some(v) => Err(self.invalid(key, &v.to_string(), reason)),
            None => Ok(None),
        }
    }

    fn positive(&self, key: &str, reason: &str) -> Result<Option<f64>, ConfigFileError> {
        self.float(key, reason, |v| v > 0.0)
    }

    fn non_negative(&self, key: &str, reason: &str) -> Result<Option<f64>, ConfigFileError> {
        self.float(key, reason, |v| v >= 0.0)
    }

    fn interval_ms(&self, key: &str) -> Result<Option<u64>, ConfigFileError> {
        const REASON: &str = "must be a positive integer (milliseconds)";
        match self.parse::<u64>(key, REASON)? {
            Some(0) => Err(self.invalid(key, "0", REASON)),
            other => Ok(other),
        }
    }
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
