//! Camera input: drag to rotate, wheel to zoom
//!
//! Only the camera is touched here; nothing in the engine depends on it.
//! Inputs move a target and the visible camera eases toward it each frame.

use crate::colors::ColorState;
use crate::config::GlobeConfig;
use crossterm::event::{Event, KeyCode, KeyModifiers, MouseButton, MouseEventKind};

const EASE: f32 = 0.1;
const YAW_PER_CELL: f32 = 0.08;
const TILT_PER_CELL: f32 = 0.16;  // cells are about twice as tall as wide
const KEY_STEP: f32 = 0.1;
const WHEEL_STEP: f32 = 1.5;
const KEY_ZOOM_STEP: f32 = 2.0;

#[derive(Clone, Debug)]
pub struct Camera {
    pub yaw: f32,
    pub tilt: f32,
    pub distance: f32,
    target_yaw: f32,
    target_tilt: f32,
    target_distance: f32,
    min_distance: f32,
    max_distance: f32,
    max_tilt: f32,
    home_distance: f32,
    home_tilt: f32,
}

impl Camera {
    pub fn new(config: &GlobeConfig) -> Self {
        Self {
            yaw: 0.0,
            tilt: config.initial_tilt,
            distance: config.initial_zoom,
            target_yaw: 0.0,
            target_tilt: config.initial_tilt,
            target_distance: config.initial_zoom,
            min_distance: config.min_zoom,
            max_distance: config.max_zoom,
            max_tilt: config.max_tilt,
            home_distance: config.initial_zoom,
            home_tilt: config.initial_tilt,
        }
    }

    pub fn rotate(&mut self, d_yaw: f32, d_tilt: f32) {
        self.target_yaw += d_yaw;
        self.target_tilt = (self.target_tilt + d_tilt).clamp(-self.max_tilt, self.max_tilt);
    }

    /// Positive moves the camera closer
    pub fn zoom(&mut self, delta: f32) {
        self.target_distance =
            (self.target_distance - delta).clamp(self.min_distance, self.max_distance);
    }

    pub fn reset(&mut self) {
        self.target_distance = self.home_distance;
        self.target_tilt = self.home_tilt;
    }

    /// Move the visible camera 10% of the way to its target
    pub fn ease(&mut self) {
        self.yaw += (self.target_yaw - self.yaw) * EASE;
        self.tilt += (self.target_tilt - self.tilt) * EASE;
        self.distance += (self.target_distance - self.distance) * EASE;
    }

    /// Globe radius multiplier for the current distance
    pub fn scale(&self) -> f32 {
        self.home_distance / self.distance.max(0.1)
    }

    pub fn target_tilt(&self) -> f32 {
        self.target_tilt
    }

    pub fn target_distance(&self) -> f32 {
        self.target_distance
    }
}

/// What the run loop should do after an input event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    TogglePause,
    ToggleHelp,
}

pub struct InputController {
    pub camera: Camera,
    pub colors: ColorState,
    pub pointer: Option<(u16, u16)>,
    drag_from: Option<(u16, u16)>,
}

impl InputController {
    pub fn new(config: &GlobeConfig) -> Self {
        Self {
            camera: Camera::new(config),
            colors: ColorState::new(0),
            pointer: None,
            drag_from: None,
        }
    }

    pub fn handle_event(&mut self, event: &Event) -> Action {
        match event {
            Event::Key(key) => self.handle_key(key.code, key.modifiers),
            Event::Mouse(mouse) => {
                let at = (mouse.column, mouse.row);
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        self.drag_from = Some(at);
                    }
                    MouseEventKind::Drag(MouseButton::Left) => {
                        if let Some((x0, y0)) = self.drag_from {
                            let dx = at.0 as f32 - x0 as f32;
                            let dy = at.1 as f32 - y0 as f32;
                            self.camera.rotate(dx * YAW_PER_CELL, dy * TILT_PER_CELL);
                        }
                        self.drag_from = Some(at);
                    }
                    MouseEventKind::Up(MouseButton::Left) => {
                        self.drag_from = None;
                    }
                    MouseEventKind::ScrollUp => self.camera.zoom(WHEEL_STEP),
                    MouseEventKind::ScrollDown => self.camera.zoom(-WHEEL_STEP),
                    _ => {}
                }
                self.pointer = Some(at);
                Action::None
            }
            Event::FocusLost => {
                self.drag_from = None;
                self.pointer = None;
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_key(&mut self, code: KeyCode, mods: KeyModifiers) -> Action {
        if self.colors.handle_key(code) {
            return Action::None;
        }

        match code {
            KeyCode::Char('c') if mods.contains(KeyModifiers::CONTROL) => return Action::Quit,
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char(' ') => return Action::TogglePause,
            KeyCode::Char('?') => return Action::ToggleHelp,
            KeyCode::Left | KeyCode::Char('h') => self.camera.rotate(-KEY_STEP, 0.0),
            KeyCode::Right | KeyCode::Char('l') => self.camera.rotate(KEY_STEP, 0.0),
            KeyCode::Up | KeyCode::Char('k') => self.camera.rotate(0.0, KEY_STEP),
            KeyCode::Down | KeyCode::Char('j') => self.camera.rotate(0.0, -KEY_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => self.camera.zoom(KEY_ZOOM_STEP),
            KeyCode::Char('-') | KeyCode::Char('_') => self.camera.zoom(-KEY_ZOOM_STEP),
            KeyCode::Char('0') => self.camera.reset(),
            _ => {}
        }
        Action::None
    }
}
