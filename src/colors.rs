use crossterm::event::KeyCode;
use crossterm::style::Color;

/// Globe color scheme, cycled with the Shift+number keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorState {
    pub scheme: u8,
}

impl ColorState {
    pub fn new(default_scheme: u8) -> Self {
        Self { scheme: default_scheme }
    }

    /// Handle color scheme key input. Returns true if key was handled.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(')') => self.scheme = 0,  // Shift+0: green
            KeyCode::Char('!') => self.scheme = 1,  // Shift+1: ice
            KeyCode::Char('@') => self.scheme = 2,  // Shift+2: gold
            KeyCode::Char('#') => self.scheme = 3,  // Shift+3: mono
            _ => return false,
        }
        true
    }

    /// Colors for the globe itself (grid, night land, day land)
    pub fn globe_colors(&self) -> (Color, Color, Color) {
        match self.scheme {
            1 => (Color::DarkBlue, Color::DarkCyan, Color::Cyan),
            2 => (Color::DarkGrey, Color::DarkYellow, Color::Yellow),
            3 => (Color::DarkGrey, Color::Grey, Color::White),
            _ => (Color::DarkGrey, Color::DarkGreen, Color::Green),
        }
    }
}

/// Fade step for an opacity in [0, 1]: 0 is faintest, 3 is freshest
pub fn fade_level(opacity: f32) -> u8 {
    ((opacity.clamp(0.0, 1.0) * 4.0).ceil() as u8).clamp(1, 4) - 1
}

/// Point color: red when flagged suspicious, otherwise green, dimming with age
pub fn point_color(suspicious: bool, level: u8) -> (Color, bool) {
    if suspicious {
        match level {
            0 => (Color::DarkRed, false),
            1 => (Color::Red, false),
            2 => (Color::Red, true),
            _ => (Color::AnsiValue(9), true),  // Bright red
        }
    } else {
        match level {
            0 => (Color::DarkGreen, false),
            1 => (Color::Green, false),
            2 => (Color::Green, true),
            _ => (Color::AnsiValue(10), true),  // Bright green
        }
    }
}
