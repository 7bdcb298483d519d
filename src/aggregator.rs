//! Top-locations leaderboard
//!
//! Rebuilt from scratch on every change. Active point counts are small
//! (tens), so a full pass is cheaper than keeping incremental state honest.

use crate::geocache::GeoCache;
use crate::points::Point;
use std::collections::HashMap;

/// Shown while a group's coordinate has not been geocoded yet
pub const FETCHING_PLACEHOLDER: &str = "Fetching...";

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    pub id: String,
    pub count: usize,
    pub country: String,
}

struct Group<'a> {
    id: &'a str,
    count: usize,
    latest: &'a Point,
}

/// Group points by id, label each group with the country of its latest
/// point, and keep the `size` largest groups. Ties keep first-sighting order.
pub fn recompute(points: &[Point], cache: &GeoCache, size: usize) -> Vec<LeaderboardEntry> {
    let mut groups: Vec<Group> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for point in points {
        match slots.get(point.id.as_str()) {
            Some(&slot) => {
                let group = &mut groups[slot];
                group.count += 1;
                group.latest = point;
            }
            None => {
                slots.insert(point.id.as_str(), groups.len());
                groups.push(Group {
                    id: point.id.as_str(),
                    count: 1,
                    latest: point,
                });
            }
        }
    }

    // Vec::sort_by is stable
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups.truncate(size);

    groups
        .into_iter()
        .map(|g| LeaderboardEntry {
            id: g.id.to_string(),
            count: g.count,
            country: cache
                .lookup(g.latest.lat, g.latest.lon)
                .unwrap_or(FETCHING_PLACEHOLDER)
                .to_string(),
        })
        .collect()
}

/// One display line per entry: `ip: count (country)`
pub fn format_entry(entry: &LeaderboardEntry) -> String {
    format!("{}: {} ({})", entry.id, entry.count, entry.country)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, lat: f64, lon: f64, t: f64) -> Point {
        Point {
            id: id.to_string(),
            lat,
            lon,
            suspicious: false,
            created_at: t,
        }
    }

    fn ids(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn distinct_ids_keep_insertion_order() {
        let points = vec![point("A", 0.0, 0.0, 0.0), point("B", 1.0, 1.0, 1.0), point("C", 2.0, 2.0, 2.0)];
        let board = recompute(&points, &GeoCache::new(), 5);
        assert_eq!(ids(&board), ["A", "B", "C"]);
        assert!(board.iter().all(|e| e.count == 1));
    }

    #[test]
    fn sorted_by_descending_count() {
        let points = vec![
            point("A", 0.0, 0.0, 0.0),
            point("B", 1.0, 1.0, 1.0),
            point("B", 1.0, 1.0, 2.0),
            point("C", 2.0, 2.0, 3.0),
            point("C", 2.0, 2.0, 4.0),
            point("C", 2.0, 2.0, 5.0),
        ];
        let board = recompute(&points, &GeoCache::new(), 5);
        assert_eq!(ids(&board), ["C", "B", "A"]);
        assert_eq!(board.iter().map(|e| e.count).collect::<Vec<_>>(), [3, 2, 1]);
    }

    #[test]
    fn truncates_to_size() {
        let points: Vec<Point> = (0..8)
            .map(|i| point(&format!("10.0.0.{}", i), 0.0, 0.0, i as f64))
            .collect();
        let board = recompute(&points, &GeoCache::new(), 5);
        assert_eq!(board.len(), 5);
        assert_eq!(board[0].id, "10.0.0.0");
        assert_eq!(board[4].id, "10.0.0.4");

        assert!(recompute(&points, &GeoCache::new(), 0).is_empty());
    }

    #[test]
    fn country_comes_from_latest_point_in_group() {
        let mut cache = GeoCache::new();
        cache.insert_resolved(48.9, 2.3, "France");
        cache.insert_resolved(52.5, 13.4, "Germany");

        let points = vec![point("A", 48.9, 2.3, 0.0), point("A", 52.5, 13.4, 1.0)];
        let board = recompute(&points, &cache, 5);
        assert_eq!(board[0].country, "Germany");
        assert_eq!(board[0].count, 2);
    }

    #[test]
    fn unresolved_country_uses_placeholder() {
        let board = recompute(&[point("A", 10.0, 10.0, 0.0)], &GeoCache::new(), 5);
        assert_eq!(board[0].country, FETCHING_PLACEHOLDER);
    }

    #[test]
    fn empty_store_gives_empty_board() {
        assert!(recompute(&[], &GeoCache::new(), 5).is_empty());
    }

    #[test]
    fn entry_formatting() {
        let entry = LeaderboardEntry {
            id: "1.2.3.4".into(),
            count: 2,
            country: "Chile".into(),
        };
        assert_eq!(format_entry(&entry), "1.2.3.4: 2 (Chile)");
    }
}
