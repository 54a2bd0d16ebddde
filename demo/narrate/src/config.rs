use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use narration_core::playback::HighlightConfig;

/// High-level configuration for the narrate demo
#[derive(Clone, Debug)]
pub struct NarrateConfig {
    pub api: ApiConfig,
    pub playback: PlaybackConfig,
    pub highlight: HighlightConfig,
    /// Article root used to render the page being narrated
    pub content_dir: PathBuf,
    /// Slug narrated when none is given on the command line
    pub slug: Option<String>,
}

/// Where the narration API lives
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

/// Simulated playback
#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// Playback speed relative to real time
    pub rate: f64,
    pub frame_interval_ms: u64,
    /// Spread words evenly when the narration came without timings
    pub estimate_when_unaligned: bool,
    /// Assumed audio length when nothing else tells us
    pub fallback_duration_secs: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let host = std::env::var("NARRATION_HOST")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = std::env::var("NARRATION_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);
        Self {
            base_url: std::env::var("NARRATE_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("http://{host}:{port}")),
            // synthesis on a cold cache can take a while
            request_timeout_ms: std::env::var("NARRATE_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(90_000),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            rate: std::env::var("NARRATE_RATE")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|r| *r > 0.0)
                .unwrap_or(1.0),
            frame_interval_ms: 16,
            estimate_when_unaligned: true,
            fallback_duration_secs: 30.0,
        }
    }
}

impl Default for NarrateConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            playback: PlaybackConfig::default(),
            highlight: HighlightConfig::default(),
            content_dir: std::env::var("NARRATION_CONTENT_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("content")),
            slug: std::env::var("NARRATE_SLUG").ok().filter(|s| !s.is_empty()),
        }
    }
}

impl NarrateConfig {
    /// Load configuration from a TOML file (path via NARRATE_CONFIG or ./narrate.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let default = Self::default();
        let path = std::env::var("NARRATE_CONFIG").unwrap_or_else(|_| "narrate.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target: "narrate", path = %path, "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match Self::from_toml_str(&s, default.clone()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(target: "narrate", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "narrate", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    pub fn from_toml_str(s: &str, base: Self) -> Result<Self, toml::de::Error> {
        toml::from_str::<NarrateToml>(s).map(|t| t.overlay(base))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.request_timeout_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.playback.frame_interval_ms.max(1))
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct NarrateToml {
    pub slug: Option<String>,
    pub content_dir: Option<PathBuf>,
    pub api: Option<ApiToml>,
    pub playback: Option<PlaybackToml>,
    pub highlight: Option<HighlightToml>,
}

impl NarrateToml {
    fn overlay(self, mut base: NarrateConfig) -> NarrateConfig {
        if let Some(s) = self.slug {
            base.slug = Some(s);
        }
        if let Some(d) = self.content_dir {
            base.content_dir = d;
        }
        if let Some(a) = self.api {
            a.apply(&mut base.api);
        }
        if let Some(p) = self.playback {
            p.apply(&mut base.playback);
        }
        if let Some(h) = self.highlight {
            h.apply(&mut base.highlight);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ApiToml {
    pub base_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
}
impl ApiToml {
    fn apply(self, a: &mut ApiConfig) {
        if let Some(x) = self.base_url {
            a.base_url = x;
        }
        if let Some(x) = self.request_timeout_ms {
            a.request_timeout_ms = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct PlaybackToml {
    pub rate: Option<f64>,
    pub frame_interval_ms: Option<u64>,
    pub estimate_when_unaligned: Option<bool>,
    pub fallback_duration_secs: Option<f64>,
}
impl PlaybackToml {
    fn apply(self, p: &mut PlaybackConfig) {
        if let Some(x) = self.rate.filter(|r| *r > 0.0) {
            p.rate = x;
        }
        if let Some(x) = self.frame_interval_ms {
            p.frame_interval_ms = x;
        }
        if let Some(x) = self.estimate_when_unaligned {
            p.estimate_when_unaligned = x;
        }
        if let Some(x) = self.fallback_duration_secs {
            p.fallback_duration_secs = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct HighlightToml {
    pub scroll_debounce_ms: Option<u64>,
    pub band_low: Option<f64>,
    pub band_high: Option<f64>,
}
impl HighlightToml {
    fn apply(self, h: &mut HighlightConfig) {
        if let Some(x) = self.scroll_debounce_ms {
            h.scroll_debounce = Duration::from_millis(x);
        }
        if let Some(x) = self.band_low {
            h.band_low = x;
        }
        if let Some(x) = self.band_high {
            h.band_high = x;
        }
    }
}
