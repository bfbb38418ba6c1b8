use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const WORLD_URL: &str = "https://d3js.org/world-110m.v1.json";
pub const STRIKES_URL: &str =
    "https://raw.githubusercontent.com/FreeCodeCamp/ProjectReferenceData/master/meteorite-strike-data.json";

/// Where a dataset comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Http(String),
    File(PathBuf),
}

impl Source {
    /// `http(s)://` URLs are fetched; `file://` URLs and bare paths are read
    /// from disk.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Source::Http(s.to_string())
        } else if let Some(path) = s.strip_prefix("file://") {
            Source::File(PathBuf::from(path))
        } else {
            Source::File(PathBuf::from(s))
        }
    }

    pub fn location(&self) -> String {
        match self {
            Source::Http(url) => url.clone(),
            Source::File(path) => path.display().to_string(),
        }
    }
}

/// Globe settings. Defaults reproduce the classic 960×500 meteorite globe;
/// each can be overridden through a `GLOBE_*` environment variable.
#[derive(Clone, Debug)]
pub struct GlobeConfig {
    /// Logical canvas width
    pub width: f64,
    /// Logical canvas height
    pub height: f64,
    /// Projection scale at zoom factor 1 (disc radius in logical units)
    pub scale: f64,
    /// Rotation the drag offset is applied on top of
    pub origin: (f64, f64),
    pub clip_angle: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub world: Source,
    /// Name of the topology object holding the countries
    pub countries_object: String,
    pub strikes: Source,
    pub fetch_timeout: Duration,
    pub svg_path: PathBuf,
    pub log_file: PathBuf,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 500.0,
            scale: 250.0,
            origin: (0.0, -20.0),
            clip_angle: 90.0,
            min_zoom: 0.25,
            max_zoom: 8.0,
            world: Source::Http(WORLD_URL.to_string()),
            countries_object: "countries".to_string(),
            strikes: Source::Http(STRIKES_URL.to_string()),
            fetch_timeout: Duration::from_secs(30),
            svg_path: PathBuf::from("globe.svg"),
            log_file: PathBuf::from("meteor-globe.log"),
        }
    }
}

impl GlobeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Log destination alone, so logging can start before the rest of the
    /// config is read.
    pub fn log_file_from_env() -> PathBuf {
        std::env::var_os("GLOBE_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::default().log_file)
    }

    /// Build from defaults plus whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("GLOBE_WORLD_URL") {
            config.world = Source::parse(&url);
        }
        if let Some(url) = lookup("GLOBE_STRIKES_URL") {
            config.strikes = Source::parse(&url);
        }
        if let Some(secs) = number(&lookup, "GLOBE_FETCH_TIMEOUT_SECS") {
            match Duration::try_from_secs_f64(secs) {
                Ok(timeout) => config.fetch_timeout = timeout,
                Err(err) => warn!(secs, %err, "fetch timeout out of range, using default"),
            }
        }
        if let Some(min) = number(&lookup, "GLOBE_MIN_ZOOM") {
            config.min_zoom = min;
        }
        if let Some(max) = number(&lookup, "GLOBE_MAX_ZOOM") {
            config.max_zoom = max;
        }
        if config.min_zoom > config.max_zoom {
            warn!(
                min = config.min_zoom,
                max = config.max_zoom,
                "zoom bounds inverted, using defaults"
            );
            let defaults = Self::default();
            config.min_zoom = defaults.min_zoom;
            config.max_zoom = defaults.max_zoom;
        }
        if let Some(path) = lookup("GLOBE_SVG_PATH") {
            config.svg_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("GLOBE_LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }

        config
    }
}

/// Positive finite number from the environment; anything else is ignored.
fn number(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        _ => {
            warn!(key, value = %raw, "ignoring invalid number");
            None
        }
    }
}
