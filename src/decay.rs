//! Per-frame expiry sweep

use crate::session::{AgedPoint, Presenter, Session};

/// Drop expired points, report the removals along with the age of every
/// survivor, and refresh the leaderboard when anything left.
/// Returns the number of points removed.
pub fn sweep(session: &mut Session, now: f64, presenter: &mut dyn Presenter) -> usize {
    let removed = session.points.expire(now);

    {
        let store = &session.points;
        let aged: Vec<AgedPoint> = store
            .all()
            .iter()
            .map(|point| AgedPoint {
                point,
                fraction: store.age_fraction(point, now),
            })
            .collect();
        presenter.points_changed(&[], &removed, &aged);
    }

    if !removed.is_empty() {
        log::debug!("expired {} point(s)", removed.len());
        session.recompute(presenter);
    }

    removed.len()
}
