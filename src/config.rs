use crate::settings::Settings;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str = "http://localhost:5000/data";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = concat!("packetglobe/", env!("CARGO_PKG_VERSION"));

// Frame delay bounds, seconds
const MIN_TIME_STEP: f32 = 0.005;
const MAX_TIME_STEP: f32 = 5.0;

/// Point lifetime, polling period and leaderboard length
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub max_age: f64,
    pub poll_interval: Duration,
    pub leaderboard_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_age: 10.0,
            poll_interval: Duration::from_millis(250),
            leaderboard_size: 5,
        }
    }
}

/// Where packet batches come from
#[derive(Clone, Debug, PartialEq)]
pub enum FeedSource {
    Http { url: String, timeout: Duration },
    Demo { seed: Option<u64> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeocoderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Camera and frame settings for the terminal globe
#[derive(Clone, Debug, PartialEq)]
pub struct GlobeConfig {
    pub time_step: f32,
    pub min_zoom: f32,      // Closest camera distance
    pub max_zoom: f32,      // Farthest camera distance
    pub initial_zoom: f32,
    pub max_tilt: f32,      // Radians either side of the equator
    pub initial_tilt: f32,  // Radians
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            time_step: 0.03,
            min_zoom: 5.0,
            max_zoom: 30.0,
            initial_zoom: 15.0,
            max_tilt: std::f32::consts::FRAC_PI_2,
            initial_tilt: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub engine: EngineConfig,
    pub feed: FeedSource,
    pub geocoder: GeocoderConfig,
    pub globe: GlobeConfig,
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line; these win over the settings file
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub feed_url: Option<String>,
    pub demo: bool,
    pub seed: Option<u64>,
    pub geocoder_url: Option<String>,
    pub no_geocode: bool,
    pub max_age: Option<f64>,
    pub poll_ms: Option<u64>,
    pub top: Option<usize>,
    pub time_step: Option<f32>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Merge defaults, the settings file and command line overrides
    pub fn resolve(settings: &Settings, cli: &Overrides) -> Self {
        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            max_age: cli
                .max_age
                .or(settings.engine.max_age)
                .filter(|a| a.is_finite() && *a > 0.0)
                .unwrap_or(defaults.max_age),
            poll_interval: cli
                .poll_ms
                .or(settings.engine.poll_interval_ms)
                .map(|ms| Duration::from_millis(ms.max(10)))
                .unwrap_or(defaults.poll_interval),
            leaderboard_size: cli
                .top
                .or(settings.engine.leaderboard_size)
                .unwrap_or(defaults.leaderboard_size),
        };

        let demo = cli.demo || (cli.feed_url.is_none() && settings.feed.demo.unwrap_or(false));
        let feed = if demo {
            FeedSource::Demo { seed: cli.seed }
        } else {
            FeedSource::Http {
                url: cli
                    .feed_url
                    .clone()
                    .or_else(|| settings.feed.url.clone())
                    .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
                timeout: Duration::from_millis(settings.feed.timeout_ms.unwrap_or(2000)),
            }
        };

        let geo_defaults = GeocoderConfig::default();
        let geocoder = GeocoderConfig {
            enabled: !cli.no_geocode && settings.geocoder.enabled.unwrap_or(true),
            base_url: cli
                .geocoder_url
                .clone()
                .or_else(|| settings.geocoder.url.clone())
                .unwrap_or(geo_defaults.base_url),
            user_agent: settings
                .geocoder
                .user_agent
                .clone()
                .unwrap_or(geo_defaults.user_agent),
            timeout: settings
                .geocoder
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(geo_defaults.timeout),
        };

        let globe_defaults = GlobeConfig::default();
        let min_zoom = settings.globe.min_zoom.unwrap_or(globe_defaults.min_zoom).max(1.0);
        let max_zoom = settings.globe.max_zoom.unwrap_or(globe_defaults.max_zoom).max(min_zoom);
        let globe = GlobeConfig {
            time_step: cli
                .time_step
                .filter(|t| t.is_finite())
                .unwrap_or(globe_defaults.time_step)
                .clamp(MIN_TIME_STEP, MAX_TIME_STEP),
            min_zoom,
            max_zoom,
            initial_zoom: globe_defaults.initial_zoom.clamp(min_zoom, max_zoom),
            max_tilt: globe_defaults.max_tilt,
            initial_tilt: settings
                .globe
                .tilt
                .map(f32::to_radians)
                .unwrap_or(globe_defaults.initial_tilt)
                .clamp(-globe_defaults.max_tilt, globe_defaults.max_tilt),
        };

        Self {
            engine,
            feed,
            geocoder,
            globe,
            log_file: cli.log_file.clone().or_else(|| settings.globe.log_file.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied_without_settings() {
        let config = Config::resolve(&Settings::default(), &Overrides::default());
        assert_eq!(config.engine.max_age, 10.0);
        assert_eq!(config.engine.poll_interval, Duration::from_millis(250));
        assert_eq!(config.engine.leaderboard_size, 5);
        assert_eq!(config.globe.min_zoom, 5.0);
        assert_eq!(config.globe.max_zoom, 30.0);
        assert_eq!(config.globe.initial_zoom, 15.0);
        assert!(matches!(config.feed, FeedSource::Http { ref url, .. } if url == DEFAULT_FEED_URL));
        assert!(config.geocoder.enabled);
    }

    #[test]
    fn cli_beats_settings_file() {
        let mut settings = Settings::default();
        settings.engine.max_age = Some(20.0);
        settings.feed.url = Some("http://file:1/data".into());

        let cli = Overrides {
            max_age: Some(3.0),
            feed_url: Some("http://cli:2/data".into()),
            ..Overrides::default()
        };
        let config = Config::resolve(&settings, &cli);
        assert_eq!(config.engine.max_age, 3.0);
        assert!(matches!(config.feed, FeedSource::Http { ref url, .. } if url == "http://cli:2/data"));
    }

    #[test]
    fn settings_file_beats_defaults() {
        let mut settings = Settings::default();
        settings.engine.leaderboard_size = Some(8);
        settings.geocoder.user_agent = Some("me@example.org".into());
        let config = Config::resolve(&settings, &Overrides::default());
        assert_eq!(config.engine.leaderboard_size, 8);
        assert_eq!(config.geocoder.user_agent, "me@example.org");
    }

    #[test]
    fn demo_flag_selects_demo_feed() {
        let cli = Overrides {
            demo: true,
            seed: Some(9),
            ..Overrides::default()
        };
        let config = Config::resolve(&Settings::default(), &cli);
        assert_eq!(config.feed, FeedSource::Demo { seed: Some(9) });
    }

    #[test]
    fn explicit_feed_url_overrides_demo_setting() {
        let mut settings = Settings::default();
        settings.feed.demo = Some(true);
        let cli = Overrides {
            feed_url: Some("http://x/data".into()),
            ..Overrides::default()
        };
        assert!(matches!(
            Config::resolve(&settings, &cli).feed,
            FeedSource::Http { .. }
        ));
    }

    #[test]
    fn nonsense_max_age_falls_back() {
        let cli = Overrides {
            max_age: Some(-1.0),
            ..Overrides::default()
        };
        assert_eq!(Config::resolve(&Settings::default(), &cli).engine.max_age, 10.0);
    }

    #[test]
    fn nonsense_time_step_is_bounded() {
        let resolve = |t: f32| {
            let cli = Overrides {
                time_step: Some(t),
                ..Overrides::default()
            };
            Config::resolve(&Settings::default(), &cli).globe.time_step
        };
        assert_eq!(resolve(f32::INFINITY), 0.03);
        assert_eq!(resolve(f32::NAN), 0.03);
        assert_eq!(resolve(0.0), MIN_TIME_STEP);
        assert_eq!(resolve(1e9), MAX_TIME_STEP);
        assert!(std::time::Duration::try_from_secs_f32(resolve(f32::INFINITY)).is_ok());
    }

    #[test]
    fn zoom_bounds_stay_ordered() {
        let mut settings = Settings::default();
        settings.globe.min_zoom = Some(20.0);
        settings.globe.max_zoom = Some(10.0);
        let globe = Config::resolve(&settings, &Overrides::default()).globe;
        assert!(globe.min_zoom <= globe.max_zoom);
        assert!(globe.initial_zoom >= globe.min_zoom && globe.initial_zoom <= globe.max_zoom);
    }
}
