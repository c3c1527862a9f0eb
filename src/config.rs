use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub debounce: DebounceConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub performance: PerformanceConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub abtest: AbTestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_cache_capacity() -> usize {
    100
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_sweep_interval_secs() -> u64 {
    60
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Idle window: execution waits until no new call arrives for this long.
    #[serde(default = "default_idle_window_ms")]
    pub idle_window_ms: u64,
    /// Ceiling under sustained input: a burst never defers longer than this.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

fn default_idle_window_ms() -> u64 {
    300
}
fn default_max_wait_ms() -> u64 {
    1000
}

impl DebounceConfig {
    pub fn idle_window(&self) -> Duration {
        Duration::from_millis(self.idle_window_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            idle_window_ms: default_idle_window_ms(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_max_entries")]
    pub max_entries: usize,
}

fn default_history_max_entries() -> usize {
    50
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_history_max_entries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Below this many milliseconds a search is classified as fast.
    #[serde(default = "default_fast_threshold_ms")]
    pub fast_threshold_ms: u64,
    /// Above this many milliseconds a search is classified as slow.
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    #[serde(default = "default_max_measurements")]
    pub max_measurements: usize,
    #[serde(default = "default_measurement_max_age_secs")]
    pub measurement_max_age_secs: u64,
    /// Complexity score weights. Tunable heuristics, not a contract.
    #[serde(default = "default_text_weight")]
    pub complexity_text_weight: f64,
    #[serde(default = "default_filter_weight")]
    pub complexity_filter_weight: f64,
    #[serde(default = "default_location_weight")]
    pub complexity_location_weight: f64,
    /// A record scoring above this is considered a complex query.
    #[serde(default = "default_complex_query_score")]
    pub complex_query_score: f64,
    /// Aggregate alert thresholds.
    #[serde(default = "default_min_cache_hit_rate")]
    pub min_cache_hit_rate: f64,
    #[serde(default = "default_max_slow_rate")]
    pub max_slow_rate: f64,
}

fn default_fast_threshold_ms() -> u64 {
    500
}
fn default_slow_threshold_ms() -> u64 {
    2000
}
fn default_max_measurements() -> usize {
    500
}
fn default_measurement_max_age_secs() -> u64 {
    3600
}
fn default_text_weight() -> f64 {
    1.0
}
fn default_filter_weight() -> f64 {
    2.0
}
fn default_location_weight() -> f64 {
    3.0
}
fn default_complex_query_score() -> f64 {
    10.0
}
fn default_min_cache_hit_rate() -> f64 {
    0.3
}
fn default_max_slow_rate() -> f64 {
    0.2
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            fast_threshold_ms: default_fast_threshold_ms(),
            slow_threshold_ms: default_slow_threshold_ms(),
            max_measurements: default_max_measurements(),
            measurement_max_age_secs: default_measurement_max_age_secs(),
            complexity_text_weight: default_text_weight(),
            complexity_filter_weight: default_filter_weight(),
            complexity_location_weight: default_location_weight(),
            complex_query_score: default_complex_query_score(),
            min_cache_hit_rate: default_min_cache_hit_rate(),
            max_slow_rate: default_max_slow_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    /// Searches slower than this trigger a real-time issue event.
    #[serde(default = "default_issue_duration_ms")]
    pub issue_duration_ms: u64,
}

fn default_max_events() -> usize {
    1000
}
fn default_issue_duration_ms() -> u64 {
    3000
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            issue_duration_ms: default_issue_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestConfig {
    #[serde(default = "default_max_ab_events")]
    pub max_events_per_test: usize,
}

fn default_max_ab_events() -> usize {
    500
}

impl Default for AbTestConfig {
    fn default() -> Self {
        Self {
            max_events_per_test: default_max_ab_events(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_path()?;
        if let Some(path) = config_path {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&content).with_context(|| "Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    fn find_config_path() -> Result<Option<PathBuf>> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("inksearch/config.toml");
            if xdg_path.exists() {
                return Ok(Some(xdg_path));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".inksearch.toml");
            if home_path.exists() {
                return Ok(Some(home_path));
            }
        }

        let current_path = Path::new(".inksearch.toml");
        if current_path.exists() {
            return Ok(Some(current_path.to_path_buf()));
        }

        Ok(None)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            debounce: DebounceConfig::default(),
            history: HistoryConfig::default(),
            performance: PerformanceConfig::default(),
            analytics: AnalyticsConfig::default(),
            abtest: AbTestConfig::default(),
        }
    }
}
