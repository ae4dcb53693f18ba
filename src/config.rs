//! Provides a ConfigManager to read and refresh config from files.
//!

use color_eyre::Result;
use config;
use log::*;
use notify::{RecommendedWatcher, Watcher};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc::UnboundedSender;

use crate::event::{AppEvent, Event};
use crate::telemetry::SamplerSettings;

pub const DEFAULT_FILE: &str = "vitals.toml";

/// External tool hand-off: what to launch and where to look for it when
/// the command is not an absolute path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Command line, split with shell quoting rules.
    pub command: Option<String>,
    /// Directories probed for the executable before `$PATH`.
    #[serde(default)]
    pub fallback_paths: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            command: None,
            fallback_paths: vec!["/usr/local/bin".to_string(), "/usr/bin".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalsConfig {
    /// Telemetry poll period in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long a GPU/network probe result stays fresh.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    /// Samples retained per metric history.
    #[serde(default = "default_history_points")]
    pub history_points: usize,
    /// Hard limit on each shell probe.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Volume whose usage is reported in the storage panel.
    #[serde(default = "default_volume")]
    pub volume: String,
    #[serde(default)]
    pub tool: ToolConfig,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            history_points: default_history_points(),
            probe_timeout_ms: default_probe_timeout_ms(),
            volume: default_volume(),
            tool: ToolConfig::default(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_cache_ttl_ms() -> u64 {
    5_000
}

fn default_history_points() -> usize {
    60
}

fn default_probe_timeout_ms() -> u64 {
    1_500
}

fn default_volume() -> String {
    "/".to_string()
}

impl VitalsConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            cache_ttl: Duration::from_millis(self.cache_ttl_ms),
            history_points: self.history_points,
            volume: self.volume.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    pub file_path: PathBuf,
    config: VitalsConfig,
    _watcher: RecommendedWatcher,
}

impl ConfigManager {
    pub fn new(file_path: PathBuf, sender: UnboundedSender<Event>) -> Result<ConfigManager> {
        let captured = sender.clone();
        let mut watcher = notify::recommended_watcher(move |_| {
            let _ = captured.send(Event::App(AppEvent::Reload));
        })?;
        if file_path.exists() {
            info!(target: "Config", "Watching file {:?}", file_path);
            watcher.watch(&file_path, notify::RecursiveMode::NonRecursive)?;
        } else {
            warn!(target: "Config", "No config file at {:?}; using defaults", file_path);
        }
        Ok(ConfigManager {
            file_path: file_path.clone(),
            config: Self::load_from_file(file_path)?,
            _watcher: watcher,
        })
    }

    pub fn current(&self) -> VitalsConfig {
        self.config.clone()
    }

    pub fn reload(&mut self) -> Result<VitalsConfig> {
        self.config = Self::load_from_file(self.file_path.clone())?;
        Ok(self.current())
    }

    fn load_from_file(file_path: PathBuf) -> Result<VitalsConfig> {
        let raw = config::Config::builder()
            .add_source(config::File::from(file_path).required(false))
            .add_source(config::Environment::with_prefix("VITALS_"))
            .build()?;
        Ok(raw.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_periods() {
        let cfg = VitalsConfig::default();
        assert_eq!(cfg.poll_interval_ms, 2_000);
        assert_eq!(cfg.cache_ttl_ms, 5_000);
        assert_eq!(cfg.history_points, 60);
        assert_eq!(cfg.volume, "/");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: VitalsConfig = toml::from_str("poll_interval_ms = 500\n").unwrap();
        assert_eq!(cfg.poll_interval_ms, 500);
        assert_eq!(cfg.cache_ttl_ms, 5_000);
        assert!(cfg.tool.command.is_none());
    }

    #[test]
    fn tool_section_round_trips() {
        let cfg: VitalsConfig = toml::from_str(
            "[tool]\ncommand = \"nvtop --delay 5\"\nfallback_paths = [\"/opt/tools/bin\"]\n",
        )
        .unwrap();
        assert_eq!(cfg.tool.command.as_deref(), Some("nvtop --delay 5"));
        assert_eq!(cfg.tool.fallback_paths, vec!["/opt/tools/bin"]);
    }

    #[test]
    fn sampler_settings_conversion() {
        let cfg = VitalsConfig::default();
        let settings = cfg.sampler_settings();
        assert_eq!(settings.poll_interval, Duration::from_secs(2));
        assert_eq!(settings.cache_ttl, Duration::from_secs(5));
        assert_eq!(settings.history_points, 60);
    }
}
