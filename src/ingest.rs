//! Feed polling and batch commit
//!
//! The feed call itself runs on a worker thread; the loop here decides when
//! to ask for a batch and commits finished batches on the render thread, one
//! leaderboard recompute per batch.

use crate::error::FeedError;
use crate::feed::{PacketFeed, PacketRecord};
use crate::points::Point;
use crate::session::{Presenter, Session};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

/// What one committed batch did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub added: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

/// Insert every unseen record of a batch in feed order, start geocodes for
/// the new coordinates, then recompute the leaderboard once.
pub fn commit_batch(
    session: &mut Session,
    batch: &[PacketRecord],
    now: f64,
    presenter: &mut dyn Presenter,
) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();
    let mut added: Vec<Point> = Vec::new();

    for record in batch {
        if !record.is_plottable() {
            // The feed repeats its history, so only the first sighting is a warning
            if session.note_rejected(&record.ip_address) {
                log::warn!(
                    "dropping {} with bad coordinates {},{}",
                    record.ip_address, record.latitude, record.longitude
                );
            } else {
                log::debug!("dropping {} again", record.ip_address);
            }
            outcome.rejected += 1;
            continue;
        }

        let inserted = session.points.insert(
            &record.ip_address,
            record.latitude,
            record.longitude,
            record.suspicious,
            now,
        );

        match inserted {
            Some(point) => {
                added.push(point.clone());
                outcome.added += 1;
            }
            None => outcome.duplicates += 1,
        }
    }

    for point in &added {
        if session.geo.lookup(point.lat, point.lon).is_none() {
            session.request_country(point.lat, point.lon);
        }
    }

    if !added.is_empty() {
        log::debug!("{} new point(s), {} active", added.len(), session.points.len());
        presenter.points_changed(&added, &[], &[]);
    }

    session.recompute(presenter);
    outcome
}

// ============================================================================
// Feed Worker
// ============================================================================

type FetchResult = Result<Vec<PacketRecord>, FeedError>;

/// Owns the feed on its own thread; one request in flight at a time
struct FeedWorker {
    requests: Sender<()>,
    results: Receiver<FetchResult>,
    busy: bool,
    gone: bool,
}

impl FeedWorker {
    fn spawn(mut feed: Box<dyn PacketFeed>) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<()>();
        let (res_tx, res_rx) = mpsc::channel();

        thread::spawn(move || {
            while req_rx.recv().is_ok() {
                if res_tx.send(feed.fetch()).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: req_tx,
            results: res_rx,
            busy: false,
            gone: false,
        }
    }

    fn request(&mut self) {
        if self.requests.send(()).is_ok() {
            self.busy = true;
        } else {
            self.gone = true;
        }
    }

    fn try_recv(&mut self) -> Option<FetchResult> {
        match self.results.try_recv() {
            Ok(result) => {
                self.busy = false;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if self.gone {
                    return None;
                }
                self.busy = false;
                self.gone = true;
                Some(Err(FeedError::WorkerGone))
            }
        }
    }
}

// ============================================================================
// Ingest Loop
// ============================================================================

pub struct IngestLoop {
    worker: FeedWorker,
    interval: f64,
    last_request: Option<f64>,
    source: String,
}

impl IngestLoop {
    pub fn new(feed: Box<dyn PacketFeed>, interval: Duration) -> Self {
        let source = feed.describe();
        Self {
            worker: FeedWorker::spawn(feed),
            interval: interval.as_secs_f64(),
            last_request: None,
            source,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// A new poll is due: the period has elapsed and nothing is outstanding
    pub fn due(&self, now: f64) -> bool {
        if self.worker.busy || self.worker.gone {
            return false;
        }
        match self.last_request {
            Some(t) => now - t >= self.interval,
            None => true,
        }
    }

    /// Ask for a batch when due, and commit one if it has arrived.
    /// Feed failures are logged and the tick is skipped.
    pub fn tick(
        &mut self,
        session: &mut Session,
        now: f64,
        presenter: &mut dyn Presenter,
    ) -> Option<IngestOutcome> {
        if self.due(now) {
            self.worker.request();
            self.last_request = Some(now);
        }

        match self.worker.try_recv()? {
            Ok(batch) => Some(commit_batch(session, &batch, now, presenter)),
            Err(e) => {
                log::warn!("feed {} unavailable: {}", self.source, e);
                None
            }
        }
    }
}
