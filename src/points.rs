//! Active geo-points with time-to-live decay
//!
//! Points are keyed by their source identifier (an IP string in practice).
//! A second sighting of an id that is still active is ignored; the first
//! point wins and keeps its original timestamp.

use std::collections::HashMap;
use std::time::Instant;

// ============================================================================
// Clock
// ============================================================================

/// Monotonic seconds since the session started
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Point
// ============================================================================

/// One plotted packet source. Never mutated after insertion.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub suspicious: bool,
    pub created_at: f64,
}

impl Point {
    pub fn age(&self, now: f64) -> f64 {
        now - self.created_at
    }
}

// ============================================================================
// Point Store
// ============================================================================

pub struct PointStore {
    points: Vec<Point>,
    index: HashMap<String, usize>,
    max_age: f64,
}

impl PointStore {
    pub fn new(max_age: f64) -> Self {
        Self {
            points: Vec::new(),
            index: HashMap::new(),
            max_age,
        }
    }

    pub fn has(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Point> {
        self.index.get(id).map(|&i| &self.points[i])
    }

    /// Insert a new point stamped with `now`. Returns the stored point, or
    /// `None` when the id is already active.
    pub fn insert(
        &mut self,
        id: &str,
        lat: f64,
        lon: f64,
        suspicious: bool,
        now: f64,
    ) -> Option<&Point> {
        if self.has(id) {
            return None;
        }

        let slot = self.points.len();
        self.points.push(Point {
            id: id.to_string(),
            lat,
            lon,
            suspicious,
            created_at: now,
        });
        self.index.insert(id.to_string(), slot);
        self.points.last()
    }

    /// Remove every point whose age exceeds `max_age` and return them.
    pub fn expire_older_than(&mut self, now: f64, max_age: f64) -> Vec<Point> {
        if !self.points.iter().any(|p| p.age(now) > max_age) {
            return Vec::new();
        }

        let (expired, survivors): (Vec<Point>, Vec<Point>) = std::mem::take(&mut self.points)
            .into_iter()
            .partition(|p| p.age(now) > max_age);

        self.points = survivors;
        self.index = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        expired
    }

    /// Expire using the store's own max age
    pub fn expire(&mut self, now: f64) -> Vec<Point> {
        self.expire_older_than(now, self.max_age)
    }

    /// Active points in insertion order
    pub fn all(&self) -> &[Point] {
        &self.points
    }

    /// Fraction of the lifetime used up, clamped to [0, 1].
    /// Opacity for rendering is `1 - age_fraction`.
    pub fn age_fraction(&self, point: &Point, now: f64) -> f32 {
        if self.max_age <= 0.0 {
            return 1.0;
        }
        (point.age(now) / self.max_age).clamp(0.0, 1.0) as f32
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(ids: &[&str], now: f64) -> PointStore {
        let mut store = PointStore::new(10.0);
        for id in ids {
            store.insert(id, 40.0, -74.0, false, now);
        }
        store
    }

    #[test]
    fn duplicate_insert_keeps_first_point() {
        let mut store = PointStore::new(10.0);
        assert!(store.insert("10.0.0.1", 1.0, 2.0, false, 0.0).is_some());
        assert!(store.insert("10.0.0.1", 50.0, 60.0, true, 3.0).is_none());

        assert_eq!(store.len(), 1);
        let p = store.get("10.0.0.1").unwrap();
        assert_eq!(p.created_at, 0.0);
        assert_eq!((p.lat, p.lon), (1.0, 2.0));
        assert!(!p.suspicious);
    }

    #[test]
    fn has_tracks_active_ids() {
        let mut store = store_with(&["A"], 0.0);
        assert!(store.has("A"));
        assert!(!store.has("B"));
        store.expire_older_than(11.0, 10.0);
        assert!(!store.has("A"));
    }

    #[test]
    fn age_fraction_starts_at_zero_and_clamps() {
        let store = store_with(&["A"], 5.0);
        let p = store.get("A").unwrap().clone();
        assert_eq!(store.age_fraction(&p, 5.0), 0.0);
        assert!((store.age_fraction(&p, 10.0) - 0.5).abs() < 1e-6);
        assert!(store.age_fraction(&p, 14.9) < 1.0);
        assert_eq!(store.age_fraction(&p, 15.0), 1.0);
        assert_eq!(store.age_fraction(&p, 100.0), 1.0);
    }

    #[test]
    fn expiry_is_strictly_greater_than_max_age() {
        let mut store = store_with(&["A"], 0.0);
        assert!(store.expire_older_than(10.0, 10.0).is_empty());
        assert!(store.has("A"));

        let removed = store.expire_older_than(10.001, 10.0);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "A");
    }

    #[test]
    fn expire_is_idempotent_for_same_now() {
        let mut store = store_with(&["A", "B"], 0.0);
        store.insert("C", 0.0, 0.0, false, 5.0);

        let first = store.expire_older_than(11.0, 10.0);
        assert_eq!(first.len(), 2);
        let second = store.expire_older_than(11.0, 10.0);
        assert!(second.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn index_survives_compaction() {
        let mut store = PointStore::new(10.0);
        store.insert("A", 0.0, 0.0, false, 0.0);
        store.insert("B", 1.0, 1.0, false, 5.0);
        store.insert("C", 2.0, 2.0, true, 6.0);
        store.expire_older_than(12.0, 10.0);

        assert_eq!(store.get("B").unwrap().lat, 1.0);
        assert_eq!(store.get("C").unwrap().lat, 2.0);
        let ids: Vec<&str> = store.all().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["B", "C"]);
    }

    #[test]
    fn expired_id_can_be_inserted_again() {
        let mut store = store_with(&["A"], 0.0);
        store.expire(11.0);
        assert!(store.insert("A", 0.0, 0.0, false, 11.0).is_some());
        assert_eq!(store.get("A").unwrap().created_at, 11.0);
    }
}
