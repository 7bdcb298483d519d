//! Headless mode: run the engine and print the leaderboard as it changes

use crate::aggregator::{format_entry, LeaderboardEntry};
use crate::config::Config;
use crate::engine::Engine;
use crate::points::Point;
use crate::session::{AgedPoint, Presenter};
use std::io::{self, Write};
use std::time::Duration;

/// Writes a leaderboard block each time its contents differ from the last one
pub struct WatchPrinter<W: Write> {
    out: W,
    last: Vec<LeaderboardEntry>,
    error: Option<io::Error>,
}

impl<W: Write> WatchPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: Vec::new(),
            error: None,
        }
    }

    /// First write error since the last call, if any
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn print_board(&mut self, entries: &[LeaderboardEntry]) -> io::Result<()> {
        writeln!(self.out, "[{}] Top Locations:", chrono::Local::now().format("%H:%M:%S"))?;
        if entries.is_empty() {
            writeln!(self.out, "  (none)")?;
        }
        for entry in entries {
            writeln!(self.out, "  {}", format_entry(entry))?;
        }
        self.out.flush()
    }
}

impl<W: Write> Presenter for WatchPrinter<W> {
    fn points_changed(&mut self, added: &[Point], removed: &[Point], _aged: &[AgedPoint<'_>]) {
        for p in added {
            log::info!(
                "+ {} ({:.2}, {:.2}){}",
                p.id,
                p.lat,
                p.lon,
                if p.suspicious { " suspicious" } else { "" }
            );
        }
        for p in removed {
            log::debug!("- {}", p.id);
        }
    }

    fn leaderboard_changed(&mut self, entries: &[LeaderboardEntry]) {
        if entries == self.last.as_slice() {
            return;
        }
        self.last = entries.to_vec();
        if let Err(e) = self.print_board(entries) {
            self.error.get_or_insert(e);
        }
    }
}

/// Run until stdout goes away (or the process is interrupted)
pub fn run(config: &Config) -> io::Result<()> {
    let mut engine = Engine::new(config);
    let mut printer = WatchPrinter::new(io::stdout().lock());
    let frame = Duration::from_secs_f32(config.globe.time_step);

    loop {
        engine.step(&mut printer);
        if let Some(e) = printer.take_error() {
            if e.kind() == io::ErrorKind::BrokenPipe {
                return Ok(());
            }
            return Err(e);
        }
        std::thread::sleep(frame);
    }
}
