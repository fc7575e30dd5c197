//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let coefficients_file = config
        .magnetic
        .coefficients_file
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[simulator]
; Listen for simulator position datagrams (X-Plane "Send to ForeFlight")
enabled = {}
; UDP port the simulator sends to (default: 49002)
port = {}
; Seconds a simulator position takes precedence over live GPS (default: 5)
; After this the live position shows through again
priority_timeout_secs = {}
; Milliseconds between extrapolated simulator positions (default: 200)
resample_interval_ms = {}

[location]
; Seconds to keep dead-reckoning after the last live fix (default: 5)
max_extrapolation_secs = {}
; Milliseconds between extrapolated live positions (default: 200)
resample_interval_ms = {}

[guidance]
; Below this ground speed only the TOT countdown is shown (default: 30 kt)
min_moving_speed_kt = {}
; Arriving at the IP more than this early means hold, not adjust speed (default: 60 s)
close_to_ip_secs = {}
; Half-width of the on-time band (default: 2 s)
on_time_window_secs = {}
; Caution band as a multiple of the on-time band (default: 5)
caution_multiplier = {}
; Speed change available to absorb a timing error (default: 10 percent)
max_speed_change_percent = {}

[target]
; Planned run-in ground speed for new targets (default: 120 kt)
default_ground_speed_kt = {}
; How the IP offset of new targets is entered: distance or time
default_offset_type = {}
; IP offset for new targets, NM for distance or minutes for time (default: 4)
default_offset = {}

[magnetic]
; World Magnetic Model coefficient file (WMM.COF)
; If empty, the bundled WMM-2025 table is used
coefficients_file = {}

[logging]
; Log directory (default: ~/.ipinbound/logs)
directory = {}
; Log file name, cleared at the start of each session (default: ipinbound.log)
file = {}
"#,
        config.simulator.enabled,
        config.simulator.port,
        config.simulator.priority_timeout_secs,
        config.simulator.resample_interval_ms,
        config.location.max_extrapolation_secs,
        config.location.resample_interval_ms,
        config.guidance.min_moving_speed_kt,
        config.guidance.close_to_ip_secs,
        config.guidance.on_time_window_secs,
        config.guidance.caution_multiplier,
        config.guidance.max_speed_change_percent,
        config.target.default_ground_speed_kt,
        config.target.default_offset_type,
        config.target.default_offset,
        coefficients_file,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::OffsetType;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.simulator.enabled = false;
        config.simulator.port = 49010;
        config.simulator.priority_timeout_secs = 2.5;
        config.guidance.max_speed_change_percent = 12.5;
        config.target.default_offset_type = OffsetType::Time;
        config.target.default_offset = 1.5;
        config.magnetic.coefficients_file = Some(temp_dir.path().join("WMM.COF"));
        config.logging.directory = temp_dir.path().join("logs");

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        ConfigFile::default().save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, ConfigFile::default());
    }

    #[test]
    fn test_written_file_is_commented() {
        let content = to_config_string(&ConfigFile::default());
        assert!(content.contains("[simulator]"));
        assert!(content.contains("port = 49002"));
        assert!(content.contains("default_offset_type = distance"));
        assert!(content.lines().filter(|l| l.starts_with(';')).count() > 10);
    }
}
