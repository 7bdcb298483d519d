//! Packet event sources
//!
//! The collector backend answers `GET /data` with every packet it has seen
//! so far, oldest first. The demo feed imitates that behaviour locally.

use crate::error::FeedError;
use rand::prelude::*;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

// ============================================================================
// Packet Record
// ============================================================================

/// One packet event as the collector reports it
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PacketRecord {
    pub ip_address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub suspicious: bool,
}

impl PacketRecord {
    /// Finite coordinates inside the valid lat/lon ranges
    pub fn is_plottable(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// The sender posts the flag as 0/1 (sometimes 0.0), newer ones as a bool
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(f64),
        Text(String),
        Null(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Number(n) => n != 0.0,
        Flag::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Flag::Null(()) => false,
    })
}

/// Decode a `/data` response body
pub fn parse_batch(body: &str) -> Result<Vec<PacketRecord>, FeedError> {
    serde_json::from_str(body).map_err(|e| FeedError::Decode(e.to_string()))
}

// ============================================================================
// Feeds
// ============================================================================

/// Source of packet batches. Runs on the feed worker thread.
pub trait PacketFeed: Send {
    fn fetch(&mut self) -> Result<Vec<PacketRecord>, FeedError>;

    fn describe(&self) -> String;
}

/// Polls the collector's JSON endpoint
pub struct HttpFeed {
    agent: ureq::Agent,
    url: String,
}

impl HttpFeed {
    pub fn new(url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            url: url.to_string(),
        }
    }
}

impl PacketFeed for HttpFeed {
    fn fetch(&mut self) -> Result<Vec<PacketRecord>, FeedError> {
        let response = self.agent.get(&self.url).call()?;
        let body = response
            .into_string()
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        parse_batch(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// Well-known cities the demo feed scatters packets across (degrees)
const DEMO_CITIES: &[(f64, f64)] = &[
    (40.7, -74.0),   // New York
    (34.1, -118.2),  // Los Angeles
    (41.9, -87.6),   // Chicago
    (47.6, -122.3),  // Seattle
    (43.7, -79.4),   // Toronto
    (19.4, -99.1),   // Mexico City
    (-23.5, -46.6),  // Sao Paulo
    (-34.6, -58.4),  // Buenos Aires
    (-12.0, -77.0),  // Lima
    (51.5, -0.1),    // London
    (48.9, 2.3),     // Paris
    (52.5, 13.4),    // Berlin
    (40.4, -3.7),    // Madrid
    (59.3, 18.1),    // Stockholm
    (55.8, 37.6),    // Moscow
    (41.0, 29.0),    // Istanbul
    (30.0, 31.2),    // Cairo
    (-33.9, 18.4),   // Cape Town
    (6.5, 3.4),      // Lagos
    (-1.3, 36.8),    // Nairobi
    (35.7, 139.7),   // Tokyo
    (31.2, 121.5),   // Shanghai
    (37.6, 127.0),   // Seoul
    (1.4, 103.8),    // Singapore
    (28.6, 77.2),    // Delhi
    (25.3, 55.3),    // Dubai
    (-33.9, 151.2),  // Sydney
    (-36.8, 174.8),  // Auckland
];

/// Synthetic collector: accumulates random packets from the city table and
/// returns the whole history on each fetch, like the real backend does.
pub struct DemoFeed {
    rng: StdRng,
    history: Vec<PacketRecord>,
    arrival_chance: f64,
    max_history: usize,
}

impl DemoFeed {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            rng,
            history: Vec::new(),
            arrival_chance: 0.6,
            max_history: 64,
        }
    }

    fn random_packet(&mut self) -> PacketRecord {
        let (lat, lon) = DEMO_CITIES[self.rng.gen_range(0..DEMO_CITIES.len())];
        // Reuse an address now and then so dedup has something to do
        let ip_address = if !self.history.is_empty() && self.rng.gen_bool(0.2) {
            let i = self.rng.gen_range(0..self.history.len());
            self.history[i].ip_address.clone()
        } else {
            format!(
                "{}.{}.{}.{}",
                self.rng.gen_range(1..224),
                self.rng.gen_range(0..256),
                self.rng.gen_range(0..256),
                self.rng.gen_range(1..255)
            )
        };

        PacketRecord {
            ip_address,
            latitude: lat,
            longitude: lon,
            suspicious: self.rng.gen_bool(0.15),
        }
    }
}

impl PacketFeed for DemoFeed {
    fn fetch(&mut self) -> Result<Vec<PacketRecord>, FeedError> {
        if self.rng.gen_bool(self.arrival_chance) {
            let packet = self.random_packet();
            self.history.push(packet);
            if self.history.len() > self.max_history {
                self.history.remove(0);
            }
        }
        Ok(self.history.clone())
    }

    fn describe(&self) -> String {
        "demo".to_string()
    }
}
