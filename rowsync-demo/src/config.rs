//! Demo host configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use rowsync_core::{ConnectionInfo, SyncError};

/// Top-level configuration for the demo host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Playback timing.
    pub playback: PlaybackConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Editor address (`host:port`, port defaults to 1338).
    pub editor_address: String,
}

/// Playback timing. Rows are beats subdivided `rows_per_beat` times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Beats per minute.
    pub bpm: f64,
    /// Row subdivisions per beat.
    pub rows_per_beat: u32,
    /// Host frame rate driving `advance`.
    pub fps: u32,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            editor_address: "127.0.0.1:1338".into(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            rows_per_beat: 8,
            fps: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl PlaybackConfig {
    /// Rows advanced per host frame.
    pub fn rows_per_frame(&self) -> f64 {
        let rows_per_second = self.bpm / 60.0 * self.rows_per_beat as f64;
        rows_per_second / self.fps as f64
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl DemoConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Validate and resolve the editor endpoint.
    ///
    /// A missing or malformed address is fatal here, at construction,
    /// not a runtime protocol error.
    pub fn editor(&self) -> Result<ConnectionInfo, SyncError> {
        ConnectionInfo::parse(&self.network.editor_address)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = DemoConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("editor_address"));
        assert!(text.contains("rows_per_beat"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = DemoConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: DemoConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.playback.fps, 60);
        assert_eq!(parsed.network.editor_address, "127.0.0.1:1338");
    }

    #[test]
    fn empty_address_is_fatal() {
        let cfg = DemoConfig {
            network: NetworkConfig {
                editor_address: String::new(),
            },
            ..Default::default()
        };
        assert!(cfg.editor().is_err());
    }

    #[test]
    fn rows_per_frame_at_defaults() {
        // 120 bpm * 8 rows / 60 fps = 0.2666... rows per frame
        let rate = PlaybackConfig::default().rows_per_frame();
        assert!((rate - 16.0 / 60.0).abs() < 1e-9);
    }
}
