//! Coordinate -> country cache with background resolution
//!
//! Lookups run on worker threads and report back over a channel; the owner
//! drains finished lookups with `poll_completions` so the cache is only ever
//! mutated on the render thread. Keys that have a request outstanding are
//! tracked so the same coordinate is never fetched twice at once.

use crate::error::GeocodeError;
use crate::geocoder::{Geocoder, UNKNOWN_COUNTRY};
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

/// Exact coordinate pair as received. `-0.0` folds into `0.0`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CoordKey {
    lat_bits: u64,
    lon_bits: u64,
}

impl CoordKey {
    pub fn new(lat: f64, lon: f64) -> Self {
        // Adding 0.0 turns -0.0 into +0.0 and leaves everything else alone
        Self {
            lat_bits: (lat + 0.0).to_bits(),
            lon_bits: (lon + 0.0).to_bits(),
        }
    }

    pub fn lat(&self) -> f64 {
        f64::from_bits(self.lat_bits)
    }

    pub fn lon(&self) -> f64 {
        f64::from_bits(self.lon_bits)
    }
}

type Completion = (CoordKey, Result<String, GeocodeError>);

pub struct GeoCache {
    entries: HashMap<CoordKey, String>,
    in_flight: HashSet<CoordKey>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

impl GeoCache {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        Self {
            entries: HashMap::new(),
            in_flight: HashSet::new(),
            sender: tx,
            receiver: rx,
        }
    }

    /// Cached country, or `None` while unresolved or pending
    pub fn lookup(&self, lat: f64, lon: f64) -> Option<&str> {
        self.entries.get(&CoordKey::new(lat, lon)).map(String::as_str)
    }

    pub fn is_pending(&self, lat: f64, lon: f64) -> bool {
        self.in_flight.contains(&CoordKey::new(lat, lon))
    }

    /// Start a lookup unless the key is cached or already being fetched.
    /// Returns true if a request was dispatched.
    pub fn resolve(&mut self, lat: f64, lon: f64, resolver: &Arc<dyn Geocoder>) -> bool {
        let key = CoordKey::new(lat, lon);
        if self.entries.contains_key(&key) || self.in_flight.contains(&key) {
            return false;
        }

        self.in_flight.insert(key);
        let tx = self.sender.clone();
        let resolver = Arc::clone(resolver);

        log::debug!("geocoding {},{}", lat, lon);
        thread::spawn(move || {
            let result = resolver.country(key.lat(), key.lon());
            let _ = tx.send((key, result));
        });

        true
    }

    /// Move finished lookups into the cache. Returns how many landed.
    pub fn poll_completions(&mut self) -> usize {
        let mut landed = 0;

        loop {
            match self.receiver.try_recv() {
                Ok((key, result)) => {
                    self.in_flight.remove(&key);
                    let country = match result {
                        Ok(country) => country,
                        Err(e) => {
                            log::debug!("geocode {},{} failed: {}", key.lat(), key.lon(), e);
                            UNKNOWN_COUNTRY.to_string()
                        }
                    };
                    // First result wins; entries are immutable once resolved
                    self.entries.entry(key).or_insert(country);
                    landed += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }

        landed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    #[cfg(test)]
    pub(crate) fn insert_resolved(&mut self, lat: f64, lon: f64, country: &str) {
        self.entries
            .insert(CoordKey::new(lat, lon), country.to_string());
    }
}

impl Default for GeoCache {
    fn default() -> Self {
        Self::new()
    }
}
