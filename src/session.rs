//! The engine's single owner of state
//!
//! One `Session` holds the point store, the geocode cache and the last
//! leaderboard. The ingest loop, the decay sweep and the aggregator all work
//! on it by reference from the render thread.

use crate::aggregator::{self, LeaderboardEntry};
use crate::config::EngineConfig;
use crate::geocache::GeoCache;
use crate::geocoder::Geocoder;
use crate::points::{Point, PointStore};
use std::collections::HashSet;
use std::sync::Arc;

/// A surviving point and how much of its lifetime is used up
#[derive(Clone, Copy, Debug)]
pub struct AgedPoint<'a> {
    pub point: &'a Point,
    pub fraction: f32,
}

impl AgedPoint<'_> {
    pub fn opacity(&self) -> f32 {
        1.0 - self.fraction
    }
}

/// Receives every change the engine makes. The renderer and the headless
/// printer both implement this.
pub trait Presenter {
    fn points_changed(&mut self, added: &[Point], removed: &[Point], aged: &[AgedPoint<'_>]);

    fn leaderboard_changed(&mut self, entries: &[LeaderboardEntry]);
}

pub struct Session {
    pub points: PointStore,
    pub geo: GeoCache,
    resolver: Arc<dyn Geocoder>,
    leaderboard: Vec<LeaderboardEntry>,
    leaderboard_size: usize,
    rejected: HashSet<String>,
}

impl Session {
    pub fn new(config: &EngineConfig, resolver: Arc<dyn Geocoder>) -> Self {
        Self {
            points: PointStore::new(config.max_age),
            geo: GeoCache::new(),
            resolver,
            leaderboard: Vec::new(),
            leaderboard_size: config.leaderboard_size,
            rejected: HashSet::new(),
        }
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Remember an id whose record could not be plotted. True the first time.
    pub fn note_rejected(&mut self, id: &str) -> bool {
        if self.rejected.contains(id) {
            return false;
        }
        self.rejected.insert(id.to_string())
    }

    /// Kick off a country lookup for a coordinate unless it is known or pending
    pub fn request_country(&mut self, lat: f64, lon: f64) -> bool {
        self.geo.resolve(lat, lon, &self.resolver)
    }

    /// Rebuild the leaderboard and hand it to the presenter
    pub fn recompute(&mut self, presenter: &mut dyn Presenter) {
        self.leaderboard = aggregator::recompute(self.points.all(), &self.geo, self.leaderboard_size);
        presenter.leaderboard_changed(&self.leaderboard);
    }

    /// Pull finished geocodes into the cache; recompute if any landed
    pub fn absorb_geocodes(&mut self, presenter: &mut dyn Presenter) -> usize {
        let landed = self.geo.poll_completions();
        if landed > 0 {
            log::debug!("{} geocode result(s) landed", landed);
            self.recompute(presenter);
        }
        landed
    }
}
