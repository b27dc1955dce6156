//! Editor configuration.
//!
//! Every section deserializes with `#[serde(default)]`, so a partial JSON
//! file only overrides the keys it names. Durations are milliseconds.

use flow_core::Position;
use flow_core::layout::GridSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub sync: SyncConfig,
    pub clipboard: ClipboardConfig,
    pub align: AlignConfig,
    pub store: StoreConfig,
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let align = &self.align;
        for (field, value) in [
            ("align.column_spacing", align.column_spacing),
            ("align.row_spacing", align.row_spacing),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        if self.sync.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "sync.base_url",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

// ─── Sync ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Push local edits to the service automatically. Default: **true**.
    pub auto_sync: bool,

    /// Quiet period after the last local edit before a push. Default: **1000**.
    pub debounce_ms: u64,

    /// Title sent when the diagram title is blank. Default: **"My Diagram"**.
    pub default_title: String,

    /// Title used when a parse result carries none. Default: **"Updated Diagram"**.
    pub parse_title: String,

    /// Title used when a generated diagram carries none. Default: **"Generated Diagram"**.
    pub generate_title: String,

    /// Service root the endpoint paths are joined to. Default: **"http://localhost:8000/"**.
    pub base_url: String,

    /// Model name passed to the generate endpoint.
    pub model: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            debounce_ms: 1000,
            default_title: "My Diagram".into(),
            parse_title: "Updated Diagram".into(),
            generate_title: "Generated Diagram".into(),
            base_url: "http://localhost:8000/".into(),
            model: "llama-3.1-70b-versatile".into(),
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ─── Clipboard ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Horizontal shift applied to pasted nodes. Default: **50**.
    pub paste_offset_x: f32,
    /// Vertical shift applied to pasted nodes. Default: **50**.
    pub paste_offset_y: f32,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            paste_offset_x: 50.0,
            paste_offset_y: 50.0,
        }
    }
}

// ─── Auto-align ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Top-left cell of the grid. Default: **(100, 100)**.
    pub origin_x: f32,
    pub origin_y: f32,

    /// Distance between column origins. Default: **250**.
    pub column_spacing: f32,

    /// Distance between row origins. Default: **150**.
    pub row_spacing: f32,

    /// Delay before the viewport fits the aligned content. Default: **50**.
    pub fit_delay_ms: u64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            origin_x: 100.0,
            origin_y: 100.0,
            column_spacing: 250.0,
            row_spacing: 150.0,
            fit_delay_ms: 50,
        }
    }
}

impl AlignConfig {
    pub fn grid(&self) -> GridSpec {
        GridSpec {
            origin: Position::new(self.origin_x, self.origin_y),
            column_spacing: self.column_spacing,
            row_spacing: self.row_spacing,
        }
    }

    pub fn fit_delay(&self) -> Duration {
        Duration::from_millis(self.fit_delay_ms)
    }
}

// ─── Store ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Accept edges whose source is their target. Default: **true**.
    pub allow_self_loops: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            allow_self_loops: true,
        }
    }
}
