use crate::terminal::Terminal;
use crossterm::style::Color;

/// Draw a bordered box at (start_x, start_y) with one row per line.
fn draw_box(term: &mut Terminal, start_x: usize, start_y: usize, lines: &[&str], text_color: Color) {
    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = max_width + 4; // 2 chars padding each side
    let box_height = lines.len() + 2;
    let border_color = Color::White;

    // Top border: ┌─────┐
    term.set(start_x as i32, start_y as i32, '┌', Some(border_color), false);
    for x in 1..box_width - 1 {
        term.set((start_x + x) as i32, start_y as i32, '─', Some(border_color), false);
    }
    term.set((start_x + box_width - 1) as i32, start_y as i32, '┐', Some(border_color), false);

    for (i, line) in lines.iter().enumerate() {
        let y = start_y + 1 + i;
        term.set(start_x as i32, y as i32, '│', Some(border_color), false);

        let padding = max_width.saturating_sub(line.chars().count());
        let padded = format!(" {}{} ", line, " ".repeat(padding));
        term.set_str((start_x + 1) as i32, y as i32, &padded, Some(text_color), false);

        term.set((start_x + box_width - 1) as i32, y as i32, '│', Some(border_color), false);
    }

    // Bottom border: └─────┘
    let bottom_y = start_y + box_height - 1;
    term.set(start_x as i32, bottom_y as i32, '└', Some(border_color), false);
    for x in 1..box_width - 1 {
        term.set((start_x + x) as i32, bottom_y as i32, '─', Some(border_color), false);
    }
    term.set((start_x + box_width - 1) as i32, bottom_y as i32, '┘', Some(border_color), false);
}

/// Render a centered help overlay box with the provided text.
pub fn render_help_overlay(term: &mut Terminal, width: u16, height: u16, help_text: &str) {
    if help_text.is_empty() {
        return;
    }

    let lines: Vec<&str> = help_text.lines().collect();
    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let start_x = (width as usize).saturating_sub(max_width + 4) / 2;
    let start_y = (height as usize).saturating_sub(lines.len() + 2) / 2;
    draw_box(term, start_x, start_y, &lines, Color::Grey);
}

/// Boxed text panel anchored at its top-left corner
pub fn draw_panel(term: &mut Terminal, x: u16, y: u16, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    draw_box(term, x as usize, y as usize, &lines, Color::White);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_is_boxed_at_corner() {
        let mut term = Terminal::headless(40, 10);
        draw_panel(&mut term, 0, 0, &["Top Locations:".to_string(), "a: 1 (X)".to_string()]);
        assert_eq!(term.row_text(0).trim_end(), "┌────────────────┐");
        assert_eq!(term.row_text(1).trim_end(), "│ Top Locations: │");
        assert_eq!(term.row_text(2).trim_end(), "│ a: 1 (X)       │");
        assert_eq!(term.row_text(3).trim_end(), "└────────────────┘");
    }

    #[test]
    fn overlay_is_centered() {
        let mut term = Terminal::headless(20, 5);
        render_help_overlay(&mut term, 20, 5, "help");
        assert_eq!(term.row_text(2), "      │ help │      ");
    }

    #[test]
    fn empty_text_draws_nothing() {
        let mut term = Terminal::headless(10, 3);
        render_help_overlay(&mut term, 10, 3, "");
        draw_panel(&mut term, 0, 0, &[]);
        assert!(term.row_text(1).trim().is_empty());
    }
}
