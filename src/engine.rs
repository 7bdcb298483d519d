//! Wiring of feed, geocoder and session, stepped once per frame

use crate::config::{Config, FeedSource, GeocoderConfig};
use crate::decay;
use crate::feed::{DemoFeed, HttpFeed, PacketFeed};
use crate::geocoder::{Geocoder, NominatimGeocoder, OfflineGeocoder};
use crate::ingest::{IngestLoop, IngestOutcome};
use crate::points::Clock;
use crate::session::{Presenter, Session};
use std::sync::Arc;

/// What happened during one frame
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub ingested: Option<IngestOutcome>,
    pub geocoded: usize,
    pub expired: usize,
}

pub struct Engine {
    pub session: Session,
    pub ingest: IngestLoop,
    pub clock: Clock,
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(config, make_feed(&config.feed), make_geocoder(&config.geocoder))
    }

    pub fn with_parts(config: &Config, feed: Box<dyn PacketFeed>, resolver: Arc<dyn Geocoder>) -> Self {
        log::info!(
            "polling {} every {:?}, points live {}s",
            feed.describe(),
            config.engine.poll_interval,
            config.engine.max_age
        );

        Self {
            session: Session::new(&config.engine, resolver),
            ingest: IngestLoop::new(feed, config.engine.poll_interval),
            clock: Clock::new(),
        }
    }

    pub fn step(&mut self, presenter: &mut dyn Presenter) -> StepReport {
        let now = self.clock.now();
        self.step_at(now, presenter)
    }

    /// Ingest, absorb geocodes, then decay, all at the same `now`
    pub fn step_at(&mut self, now: f64, presenter: &mut dyn Presenter) -> StepReport {
        let ingested = self.ingest.tick(&mut self.session, now, presenter);
        let geocoded = self.session.absorb_geocodes(presenter);
        let expired = decay::sweep(&mut self.session, now, presenter);

        StepReport {
            ingested,
            geocoded,
            expired,
        }
    }
}

pub fn make_feed(source: &FeedSource) -> Box<dyn PacketFeed> {
    match source {
        FeedSource::Http { url, timeout } => Box::new(HttpFeed::new(url, *timeout)),
        FeedSource::Demo { seed } => Box::new(DemoFeed::new(*seed)),
    }
}

pub fn make_geocoder(config: &GeocoderConfig) -> Arc<dyn Geocoder> {
    if config.enabled {
        Arc::new(NominatimGeocoder::new(
            &config.base_url,
            &config.user_agent,
            config.timeout,
        ))
    } else {
        log::info!("geocoding disabled");
        Arc::new(OfflineGeocoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Overrides;
    use crate::geocache::tests::StubGeocoder;
    use crate::session::tests::Recorder;
    use crate::settings::Settings;
    use std::time::{Duration, Instant};

    fn demo_config() -> Config {
        let cli = Overrides {
            demo: true,
            seed: Some(3),
            max_age: Some(2.0),
            poll_ms: Some(10),
            ..Overrides::default()
        };
        Config::resolve(&Settings::default(), &cli)
    }

    #[test]
    fn demo_points_arrive_get_countries_and_expire() {
        let config = demo_config();
        let stub = StubGeocoder::answering("Atlantis");
        let mut engine = Engine::with_parts(&config, make_feed(&config.feed), stub);
        let mut rec = Recorder::default();

        // Drive simulated time forward until something has been committed
        let mut now = 0.0;
        let deadline = Instant::now() + Duration::from_secs(5);
        while engine.session.points.is_empty() && Instant::now() < deadline {
            engine.step_at(now, &mut rec);
            now += 0.011;
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(!engine.session.points.is_empty());
        assert!(!rec.added.is_empty());

        while engine.session.geo.in_flight() > 0 && Instant::now() < deadline {
            engine.step_at(now, &mut rec);
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(engine.session.leaderboard().len() <= config.engine.leaderboard_size);

        // Jump past every point's lifetime without polling again
        let first = rec.added[0].clone();
        let report = engine.step_at(now + 10.0, &mut rec);
        assert!(report.expired > 0);
        assert!(rec.removed.contains(&first));
    }

    #[test]
    fn offline_geocoder_when_disabled() {
        let config = GeocoderConfig {
            enabled: false,
            ..GeocoderConfig::default()
        };
        let geocoder = make_geocoder(&config);
        assert_eq!(geocoder.country(0.0, 0.0).unwrap(), "Unknown");
    }
}
