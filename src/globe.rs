//! Rotating braille globe with live packet points
//!
//! The view is a `Presenter`: it keeps its own copy of what the engine
//! reported (points with their age, the leaderboard) and draws that each
//! frame. Camera state lives in the input controller.

use crate::aggregator::{format_entry, LeaderboardEntry, FETCHING_PLACEHOLDER};
use crate::colors::{fade_level, point_color, ColorState};
use crate::config::Config;
use crate::controls::{Action, Camera, InputController};
use crate::engine::Engine;
use crate::geocache::GeoCache;
use crate::help::{draw_panel, render_help_overlay};
use crate::points::Point;
use crate::session::{AgedPoint, Presenter};
use crate::terminal::Terminal;
use crossterm::style::Color;
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::io;

// Continent outlines, (lat, lon) in degrees
const CONTINENTS: &[&[(f32, f32)]] = &[
    // North America
    &[
        (69.5, -90.5), (67.1, -81.4), (58.9, -94.7), (51.2, -79.9), (62.6, -77.4),
        (58.2, -67.6), (60.3, -64.6), (53.3, -55.8), (46.8, -71.1), (49.2, -65.1),
        (45.9, -59.8), (39.2, -76.3), (31.4, -81.3), (25.2, -80.4), (30.1, -84.1),
        (27.8, -97.1), (18.8, -95.9), (21.5, -87.1), (15.9, -88.9), (15.3, -83.4),
        (9.0, -82.2), (11.1, -74.9), (7.2, -80.9), (19.3, -105.0), (31.2, -113.1),
        (23.4, -109.4), (24.7, -112.2), (40.3, -124.4), (49.0, -122.8), (58.1, -134.1),
        (61.3, -150.6), (54.4, -164.8), (58.9, -157.0), (61.5, -166.1), (64.8, -160.8),
        (65.7, -168.1), (71.4, -156.6), (67.4, -108.9), (67.3, -96.1), (71.9, -95.2),
        (69.5, -90.5),
    ],
    // South America
    &[
        (11.1, -74.9), (10.7, -61.9), (4.2, -51.3), (-0.1, -50.4), (-7.3, -34.7),
        (-21.9, -40.9), (-24.9, -47.6), (-34.4, -53.8), (-33.9, -58.4), (-36.9, -56.8),
        (-41.1, -65.1), (-48.1, -66.0), (-53.8, -71.0), (-52.3, -74.9), (-46.6, -75.6),
        (-42.4, -72.7), (-18.3, -70.4), (-14.6, -76.0), (-4.7, -81.4), (3.8, -77.1),
        (9.0, -79.1), (11.1, -74.9),
    ],
    // Europe
    &[
        (31.2, 29.7), (31.2, 34.3), (36.7, 36.2), (36.7, 27.6), (39.5, 26.2),
        (41.5, 41.6), (45.2, 36.7), (47.3, 39.1), (44.4, 33.9), (46.6, 30.7),
        (41.1, 28.8), (40.3, 22.6), (36.4, 23.2), (45.6, 13.9), (40.2, 18.5),
        (37.9, 15.7), (44.4, 8.9), (36.0, -5.9), (36.9, -8.9), (43.0, -9.4),
        (43.4, -1.9), (48.7, -4.6), (53.5, 8.1), (57.1, 8.5), (54.0, 10.9),
        (54.4, 19.7), (59.2, 23.3), (60.0, 29.1), (60.7, 21.3), (65.1, 25.4),
        (65.7, 22.2), (55.4, 12.9), (59.5, 10.4), (58.6, 5.7), (62.6, 5.9),
        (69.8, 19.2), (70.5, 31.3), (69.3, 33.8), (31.2, 29.7),
    ],
    // Africa
    &[
        (29.9, 32.4), (11.7, 42.7), (10.6, 51.0), (-4.7, 39.2), (-14.7, 40.8),
        (-19.8, 34.8), (-24.1, 35.5), (-32.8, 28.2), (-34.8, 19.6), (-18.1, 11.8),
        (-10.7, 13.7), (3.7, 9.4), (6.3, 4.3), (4.4, -8.0), (14.7, -17.6),
        (29.9, 32.4),
    ],
    // Asia
    &[
        (77.0, 107.0), (70.8, 131.3), (69.4, 178.6), (62.3, 179.2), (59.9, 163.5),
        (51.0, 156.8), (56.8, 155.9), (62.6, 164.5), (54.7, 135.1), (52.2, 141.4),
        (39.8, 127.5), (35.1, 129.1), (40.9, 121.6), (39.2, 118.0), (37.5, 122.4),
        (34.9, 119.2), (28.2, 121.7), (19.8, 105.9), (13.4, 109.3), (8.6, 105.2),
        (13.4, 100.1), (1.3, 104.2), (22.8, 91.4), (15.9, 80.3), (8.0, 77.5),
        (21.4, 72.6), (30.3, 48.9), (24.0, 51.8), (26.4, 56.4), (22.3, 59.8),
        (12.6, 43.5), (21.3, 39.1), (69.3, 33.8), (67.5, 41.1), (66.6, 33.2),
        (63.8, 37.0), (68.6, 43.5), (68.1, 68.5), (71.0, 66.7), (73.0, 69.9),
        (66.2, 72.4), (72.8, 74.7), (77.0, 107.0),
    ],
    // Australia
    &[
        (-13.8, 143.6), (-26.1, 153.1), (-37.4, 150.0), (-38.0, 140.6), (-34.4, 138.2),
        (-35.3, 136.8), (-32.9, 137.8), (-34.9, 136.0), (-31.5, 131.3), (-34.2, 115.0),
        (-21.8, 114.1), (-19.7, 120.9), (-14.2, 125.7), (-15.0, 129.6), (-11.1, 132.4),
        (-11.9, 136.5), (-15.0, 135.5), (-17.7, 140.2), (-11.0, 142.1), (-13.8, 143.6),
    ],
    // Greenland
    &[
        (83.5, -27.1), (82.7, -20.8), (82.0, -31.4), (81.3, -12.2), (80.2, -20.0),
        (80.1, -17.7), (76.6, -21.7), (74.3, -19.4), (70.2, -26.4), (70.1, -22.3),
        (65.5, -39.8), (60.1, -43.4), (63.6, -51.6), (67.2, -54.0), (69.9, -50.9),
        (69.6, -54.7), (70.6, -51.4), (75.5, -58.6), (78.0, -73.3), (81.8, -62.7),
        (83.5, -27.1),
    ],
    // Japan
    &[
        (37.1, 141.0), (33.5, 135.8), (33.9, 131.0), (31.4, 130.2), (33.3, 129.4),
        (38.2, 139.4), (41.2, 140.3), (37.1, 141.0),
    ],
    // UK/Ireland
    &[
        (58.6, -3.0), (51.3, 1.4), (50.0, -5.2), (54.0, -2.9), (56.8, -6.1),
        (58.6, -3.0),
    ],
    // Antarctica
    &[
        (-64.2, -58.6), (-68.0, -65.7), (-73.7, -60.8), (-79.2, -78.0), (-83.2, -58.2),
        (-80.3, -28.5), (-78.1, -35.3), (-70.9, -6.9), (-65.8, 54.5), (-72.3, 69.9),
        (-66.2, 88.0), (-65.3, 135.1), (-71.7, 171.2), (-80.9, 159.8), (-84.7, 180.0),
        (-90.0, 180.0), (-90.0, -180.0), (-84.1, -179.1), (-85.0, -143.1), (-76.9, -158.4),
        (-73.9, -74.9), (-64.2, -58.6),
    ],
];

// Dot values; higher wins when dots share a cell
const DOT_GRID: u8 = 1;
const DOT_LAND_NIGHT: u8 = 2;
const DOT_LAND_DAY: u8 = 3;
const DOT_POINT: u8 = 10;
const DOT_SUSPICIOUS: u8 = 20;

const HELP: &str = "\
PACKET GLOBE
─────────────────
Drag   Rotate globe
Wheel  Zoom in/out
←→↑↓   Rotate (hjkl)
+/-    Zoom in/out
0      Reset view
)!@#   Color scheme
Space  Pause
?      Toggle help
q/Esc  Quit";

/// Returns the shortest angular delta from `from` to `to`, in range -PI..PI.
#[inline]
fn shortest_angular_delta(from: f32, to: f32) -> f32 {
    let mut delta = to - from;
    if delta > PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    delta
}

/// Sub-solar longitude in radians for the current UTC time
fn solar_longitude() -> f32 {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let hours_utc = ((secs % 86400) as f32) / 3600.0;
    ((12.0 - hours_utc) / 24.0) * TAU
}

// ============================================================================
// Projection
// ============================================================================

/// Orthographic projection from (lat, lon) radians to braille dot coordinates
pub struct Projection {
    half_w: f32,
    half_h: f32,
    radius: f32,
    yaw: f32,
    cos_tilt: f32,
    sin_tilt: f32,
}

impl Projection {
    pub fn new(width: u16, height: u16, camera: &Camera) -> Self {
        let w = width as f32;
        let h = height as f32;
        let base_radius = (h * 1.8).min(w * 0.8) * 0.4;

        Self {
            half_w: w / 2.0,
            half_h: h / 2.0,
            radius: base_radius * camera.scale(),
            yaw: camera.yaw,
            cos_tilt: camera.tilt.cos(),
            sin_tilt: camera.tilt.sin(),
        }
    }

    /// Dot coordinates and depth, or `None` on the far side of the globe
    pub fn project(&self, lat: f32, lon: f32) -> Option<(i32, i32, f32)> {
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = (lon + self.yaw).sin_cos();

        let x = cos_lat * sin_lon;
        let y = cos_lat * cos_lon;
        let z = sin_lat;

        let depth = y * self.cos_tilt - z * self.sin_tilt;
        let up = y * self.sin_tilt + z * self.cos_tilt;

        if depth < 0.0 {
            return None;
        }

        let screen_x = self.half_w + x * self.radius;
        let screen_y = self.half_h - up * self.radius * 0.5;

        Some(((screen_x * 2.0) as i32, (screen_y * 4.0) as i32, depth))
    }

    pub fn project_degrees(&self, lat: f64, lon: f64) -> Option<(i32, i32, f32)> {
        self.project((lat as f32).to_radians(), (lon as f32).to_radians())
    }
}

// ============================================================================
// Braille canvas
// ============================================================================

struct Canvas {
    w: usize,
    h: usize,
    dots: Vec<u8>,
}

impl Canvas {
    fn new(cols: u16, rows: u16) -> Self {
        let w = cols as usize * 2;
        let h = rows as usize * 4;
        Self { w, h, dots: vec![0; w * h] }
    }

    fn plot(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return;
        }
        let i = y as usize * self.w + x as usize;
        self.dots[i] = self.dots[i].max(value);
    }

    fn blit(&self, term: &mut Terminal, colors: &ColorState) {
        const DOT_BITS: [(usize, usize, u8); 8] = [
            (0, 0, 0x01), (1, 0, 0x02), (2, 0, 0x04),
            (0, 1, 0x08), (1, 1, 0x10), (2, 1, 0x20),
            (3, 0, 0x40), (3, 1, 0x80),
        ];
        let (grid, land_night, land_day) = colors.globe_colors();

        for cy in 0..self.h / 4 {
            for cx in 0..self.w / 2 {
                let mut bits: u8 = 0;
                let mut top: u8 = 0;
                for &(dy, dx, bit) in &DOT_BITS {
                    let v = self.dots[(cy * 4 + dy) * self.w + cx * 2 + dx];
                    if v > 0 {
                        bits |= bit;
                        top = top.max(v);
                    }
                }
                if bits == 0 {
                    continue;
                }

                let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                let (color, bold) = match top {
                    DOT_GRID => (grid, false),
                    DOT_LAND_NIGHT => (land_night, false),
                    DOT_LAND_DAY => (land_day, false),
                    v if v >= DOT_SUSPICIOUS => point_color(true, v - DOT_SUSPICIOUS),
                    v => point_color(false, v.saturating_sub(DOT_POINT)),
                };
                term.set(cx as i32, cy as i32, ch, Some(color), bold);
            }
        }
    }
}

// ============================================================================
// Globe view
// ============================================================================

pub struct GlobeView {
    points: Vec<(Point, f32)>,
    leaderboard: Vec<LeaderboardEntry>,
    source: String,
    seen: usize,
}

impl GlobeView {
    pub fn new(source: &str) -> Self {
        Self {
            points: Vec::new(),
            leaderboard: Vec::new(),
            source: source.to_string(),
            seen: 0,
        }
    }

    /// The point drawn under (or next to) a terminal cell, freshest first
    pub fn point_at(&self, proj: &Projection, column: u16, row: u16) -> Option<&Point> {
        self.points
            .iter()
            .filter_map(|(point, fraction)| {
                let (bx, by, _) = proj.project_degrees(point.lat, point.lon)?;
                let dx = (bx / 2 - column as i32).abs();
                let dy = (by / 4 - row as i32).abs();
                (dx <= 1 && dy <= 1).then_some((point, *fraction, dx + dy))
            })
            .min_by(|a, b| a.2.cmp(&b.2).then(a.1.total_cmp(&b.1)))
            .map(|(point, _, _)| point)
    }

    pub fn draw(
        &self,
        term: &mut Terminal,
        input: &InputController,
        geo: &GeoCache,
        paused: bool,
        show_help: bool,
    ) {
        let (width, height) = term.size();
        let proj = Projection::new(width, height, &input.camera);
        let mut canvas = Canvas::new(width, height);

        draw_graticule(&mut canvas, &proj);
        draw_continents(&mut canvas, &proj, solar_longitude());

        let marker: i32 = if input.camera.scale() > 1.5 { 2 } else { 1 };
        for (point, fraction) in &self.points {
            let Some((bx, by, _)) = proj.project_degrees(point.lat, point.lon) else {
                continue;
            };
            let level = fade_level(1.0 - fraction);
            let base = if point.suspicious { DOT_SUSPICIOUS } else { DOT_POINT };
            let value = base + level;
            for dy in -marker..=marker {
                for dx in -marker..=marker {
                    if dx.abs() + dy.abs() <= marker {
                        canvas.plot(bx + dx, by + dy, value);
                    }
                }
            }
        }

        term.clear();
        canvas.blit(term, &input.colors);

        let mut lines = vec!["Top Locations:".to_string()];
        lines.extend(self.leaderboard.iter().map(format_entry));
        draw_panel(term, 0, 0, &lines);

        if let Some((column, row)) = input.pointer {
            if let Some(point) = self.point_at(&proj, column, row) {
                let country = match geo.lookup(point.lat, point.lon) {
                    Some(country) => country,
                    None if geo.is_pending(point.lat, point.lon) => FETCHING_PLACEHOLDER,
                    None => "?",
                };
                let flag = if point.suspicious { " [suspicious]" } else { "" };
                let info = format!("IP: {} ({}){}", point.id, country, flag);
                term.set_str(1, height as i32 - 2, &info, Some(Color::White), true);
            }
        }

        let status = format!(
            "{} active  {} seen  {} countries  {} geocoding  feed: {}{}",
            self.points.len(),
            self.seen,
            geo.len(),
            geo.in_flight(),
            self.source,
            if paused { "  [paused]" } else { "" }
        );
        term.set_str(1, height as i32 - 1, &status, Some(Color::DarkGrey), false);

        if show_help {
            render_help_overlay(term, width, height, HELP);
        }
    }
}

impl Presenter for GlobeView {
    fn points_changed(&mut self, added: &[Point], removed: &[Point], aged: &[AgedPoint<'_>]) {
        self.seen += added.len();
        if !removed.is_empty() {
            self.points.retain(|(p, _)| !removed.iter().any(|r| r == p));
        }
        self.points.extend(added.iter().map(|p| (p.clone(), 0.0)));
        if !aged.is_empty() {
            self.points = aged.iter().map(|a| (a.point.clone(), a.fraction)).collect();
        }
    }

    fn leaderboard_changed(&mut self, entries: &[LeaderboardEntry]) {
        self.leaderboard = entries.to_vec();
    }
}

fn draw_graticule(canvas: &mut Canvas, proj: &Projection) {
    for lat_deg in (-60..=60).step_by(30) {
        let lat = (lat_deg as f32).to_radians();
        for lon_deg in 0..360 {
            let lon = (lon_deg as f32).to_radians() - PI;
            if let Some((bx, by, _)) = proj.project(lat, lon) {
                canvas.plot(bx, by, DOT_GRID);
            }
        }
    }

    for lon_deg in (0..360).step_by(30) {
        let lon = (lon_deg as f32).to_radians() - PI;
        for lat_deg in -90..=90 {
            let lat = (lat_deg as f32).to_radians();
            if let Some((bx, by, _)) = proj.project(lat, lon) {
                canvas.plot(bx, by, DOT_GRID);
            }
        }
    }
}

fn draw_continents(canvas: &mut Canvas, proj: &Projection, solar_lon: f32) {
    for outline in CONTINENTS {
        for pair in outline.windows(2) {
            let (lat1, lon1) = (pair[0].0.to_radians(), pair[0].1.to_radians());
            let (lat2, lon2) = (pair[1].0.to_radians(), pair[1].1.to_radians());

            for t in 0..20 {
                let frac = t as f32 / 20.0;
                let lat = lat1 + (lat2 - lat1) * frac;
                let lon = lon1 + (lon2 - lon1) * frac;
                if let Some((bx, by, _)) = proj.project(lat, lon) {
                    let lit = shortest_angular_delta(solar_lon, lon).abs() < FRAC_PI_2;
                    canvas.plot(bx, by, if lit { DOT_LAND_DAY } else { DOT_LAND_NIGHT });
                }
            }
        }
    }
}

/// Run the interactive globe until the user quits
pub fn run(config: &Config) -> io::Result<()> {
    let mut term = Terminal::new()?;
    let mut engine = Engine::new(config);
    let mut view = GlobeView::new(engine.ingest.source());
    let mut input = InputController::new(&config.globe);

    let mut paused = false;
    let mut show_help = false;
    let (mut prev_w, mut prev_h) = term.size();

    loop {
        let (width, height) = crossterm::terminal::size().unwrap_or((prev_w, prev_h));
        if width != prev_w || height != prev_h {
            term.resize(width, height);
            term.clear_screen()?;
            prev_w = width;
            prev_h = height;
        }

        while let Some(event) = term.poll_event()? {
            match input.handle_event(&event) {
                Action::Quit => return Ok(()),
                Action::TogglePause => paused = !paused,
                Action::ToggleHelp => show_help = !show_help,
                Action::None => {}
            }
        }

        if !paused {
            engine.step(&mut view);
            input.camera.ease();
        }

        view.draw(&mut term, &input, &engine.session.geo, paused, show_help);
        term.present()?;
        term.sleep(config.globe.time_step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobeConfig;

    fn point(id: &str, lat: f64, lon: f64, suspicious: bool) -> Point {
        Point {
            id: id.to_string(),
            lat,
            lon,
            suspicious,
            created_at: 0.0,
        }
    }

    fn flat_camera() -> Camera {
        let config = GlobeConfig {
            initial_tilt: 0.0,
            ..GlobeConfig::default()
        };
        Camera::new(&config)
    }

    #[test]
    fn facing_point_projects_to_center() {
        let proj = Projection::new(80, 40, &flat_camera());
        let (bx, by, depth) = proj.project_degrees(0.0, 0.0).unwrap();
        assert_eq!((bx, by), (80, 80));
        assert!((depth - 1.0).abs() < 1e-5);
    }

    #[test]
    fn far_side_is_hidden() {
        let proj = Projection::new(80, 40, &flat_camera());
        assert!(proj.project_degrees(0.0, 180.0).is_none());
        assert!(proj.project_degrees(10.0, 170.0).is_none());
    }

    #[test]
    fn north_is_up() {
        let proj = Projection::new(80, 40, &flat_camera());
        let (_, north_y, _) = proj.project_degrees(45.0, 0.0).unwrap();
        let (_, south_y, _) = proj.project_degrees(-45.0, 0.0).unwrap();
        assert!(north_y < south_y);
    }

    #[test]
    fn view_tracks_additions_removals_and_ages() {
        let mut view = GlobeView::new("demo");
        let a = point("A", 0.0, 0.0, false);
        let b = point("B", 10.0, 10.0, true);

        view.points_changed(&[a.clone(), b.clone()], &[], &[]);
        assert_eq!(view.points.len(), 2);
        assert_eq!(view.seen, 2);

        let aged = [AgedPoint { point: &b, fraction: 0.5 }];
        view.points_changed(&[], &[a.clone()], &aged);
        assert_eq!(view.points, vec![(b.clone(), 0.5)]);

        view.points_changed(&[], &[b], &[]);
        assert!(view.points.is_empty());
    }

    #[test]
    fn hover_finds_point_under_pointer() {
        let camera = flat_camera();
        let proj = Projection::new(80, 40, &camera);
        let mut view = GlobeView::new("demo");
        view.points_changed(&[point("8.8.8.8", 0.0, 0.0, false)], &[], &[]);

        assert_eq!(view.point_at(&proj, 40, 20).map(|p| p.id.as_str()), Some("8.8.8.8"));
        assert!(view.point_at(&proj, 5, 5).is_none());
    }

    #[test]
    fn draw_shows_leaderboard_and_status() {
        let mut term = Terminal::headless(100, 40);
        let mut view = GlobeView::new("demo");
        view.leaderboard_changed(&[LeaderboardEntry {
            id: "1.2.3.4".into(),
            count: 1,
            country: "Chile".into(),
        }]);
        let input = InputController::new(&GlobeConfig::default());

        view.draw(&mut term, &input, &GeoCache::new(), true, false);
        assert!(term.row_text(1).contains("Top Locations:"));
        assert!(term.row_text(2).contains("1.2.3.4: 1 (Chile)"));
        assert!(term.row_text(39).contains("[paused]"));
        assert!(term.row_text(39).contains("0 countries"));
    }

    #[test]
    fn suspicious_point_is_drawn_red() {
        let mut term = Terminal::headless(80, 40);
        let mut view = GlobeView::new("demo");
        let mut input = InputController::new(&GlobeConfig::default());
        input.camera = flat_camera();
        view.points_changed(&[point("A", 0.0, 0.0, true)], &[], &[]);

        view.draw(&mut term, &input, &GeoCache::new(), false, false);
        assert_eq!(term.cell(40, 20).fg, Some(Color::AnsiValue(9)));
    }

    #[test]
    fn zoomed_in_markers_are_larger() {
        let mut input = InputController::new(&GlobeConfig::default());
        input.camera = flat_camera();
        let mut view = GlobeView::new("demo");
        view.points_changed(&[point("A", 0.0, 0.0, true)], &[], &[]);

        let mut term = Terminal::headless(80, 40);
        view.draw(&mut term, &input, &GeoCache::new(), false, false);
        assert_ne!(term.cell(41, 20).fg, Some(Color::AnsiValue(9)));

        input.camera.zoom(10.0);
        for _ in 0..200 {
            input.camera.ease();
        }
        view.draw(&mut term, &input, &GeoCache::new(), false, false);
        assert_eq!(term.cell(41, 20).fg, Some(Color::AnsiValue(9)));
        assert_eq!(term.cell(39, 20).fg, Some(Color::AnsiValue(9)));
    }

    #[test]
    fn angular_delta_wraps() {
        assert!((shortest_angular_delta(3.0, -3.0) - (TAU - 6.0)).abs() < 1e-5);
        assert!((shortest_angular_delta(0.0, 1.0) - 1.0).abs() < 1e-6);
    }
}
