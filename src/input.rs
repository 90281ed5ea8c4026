//! Shared input handling: coordinate conversion, click targets, and event types.

use ratzilla::ratatui::layout::Rect;

/// Input normalized from keyboard, mouse and touch sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A printable key.
    Key(char),
    /// A tap on a registered target, identified by a semantic action ID.
    Click(u16),
    Backspace,
    Enter,
    Escape,
    Up,
    Down,
}

/// A region on screen that can be tapped/clicked to trigger an action.
#[derive(Debug, Clone)]
pub struct ClickTarget {
    /// Hit region in terminal cell coordinates.
    pub rect: Rect,
    pub action_id: u16,
}

/// Shared state between the render loop and click handler.
#[derive(Debug, Default)]
pub struct ClickState {
    pub targets: Vec<ClickTarget>,
    pub terminal_cols: u16,
    pub terminal_rows: u16,
}

impl ClickState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    pub fn add_click_target(&mut self, rect: Rect, action_id: u16) {
        if rect.width > 0 && rect.height > 0 {
            self.targets.push(ClickTarget { rect, action_id });
        }
    }

    /// Register a full-row click target at the given row within an area.
    pub fn add_row_target(&mut self, area: Rect, row: u16, action_id: u16) {
        if row >= area.y && row < area.y + area.height {
            self.add_click_target(Rect::new(area.x, row, area.width, 1), action_id);
        }
    }

    /// Hit-test a terminal cell. When targets overlap the last registered wins,
    /// matching typical UI layering where later elements are on top.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<u16> {
        self.targets.iter().rev().find_map(|t| {
            let r = &t.rect;
            if col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height {
                Some(t.action_id)
            } else {
                None
            }
        })
    }
}

/// Determine whether a screen width (in columns) should use narrow layout.
pub fn is_narrow_layout(width: u16) -> bool {
    width < 60
}

/// Convert a pixel Y coordinate (relative to the grid's top edge) to a row.
pub fn pixel_y_to_row(click_y: f64, grid_height: f64, terminal_rows: u16) -> Option<u16> {
    if grid_height <= 0.0 || terminal_rows == 0 || click_y < 0.0 {
        return None;
    }
    let cell_height = grid_height / terminal_rows as f64;
    let row = (click_y / cell_height) as u16;
    if row >= terminal_rows {
        None
    } else {
        Some(row)
    }
}

/// Convert a pixel X coordinate (relative to the grid's left edge) to a column.
pub fn pixel_x_to_col(click_x: f64, grid_width: f64, terminal_cols: u16) -> Option<u16> {
    if grid_width <= 0.0 || terminal_cols == 0 || click_x < 0.0 {
        return None;
    }
    let cell_width = grid_width / terminal_cols as f64;
    let col = (click_x / cell_width) as u16;
    if col >= terminal_cols {
        None
    } else {
        Some(col)
    }
}

/// Map a pixel offset inside the grid to a `(col, row)` cell.
pub fn pixel_to_cell(
    click_x: f64,
    click_y: f64,
    grid_width: f64,
    grid_height: f64,
    cs: &ClickState,
) -> Option<(u16, u16)> {
    let col = pixel_x_to_col(click_x, grid_width, cs.terminal_cols)?;
    let row = pixel_y_to_row(click_y, grid_height, cs.terminal_rows)?;
    Some((col, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── hit_test ───────────────────────────────────────────────────

    #[test]
    fn hit_test_basic() {
        let mut cs = ClickState::new();
        cs.add_click_target(Rect::new(0, 10, 80, 1), 1);
        cs.add_click_target(Rect::new(0, 11, 80, 1), 2);

        assert_eq!(cs.hit_test(5, 10), Some(1));
        assert_eq!(cs.hit_test(5, 11), Some(2));
        assert_eq!(cs.hit_test(5, 12), None);
    }

    #[test]
    fn hit_test_keypad_cells() {
        let mut cs = ClickState::new();
        // 3-wide keypad row: [7][8][9]
        cs.add_click_target(Rect::new(10, 5, 6, 3), 107);
        cs.add_click_target(Rect::new(16, 5, 6, 3), 108);
        cs.add_click_target(Rect::new(22, 5, 6, 3), 109);

        assert_eq!(cs.hit_test(10, 5), Some(107));
        assert_eq!(cs.hit_test(15, 7), Some(107));
        assert_eq!(cs.hit_test(16, 6), Some(108));
        assert_eq!(cs.hit_test(27, 5), Some(109));
        assert_eq!(cs.hit_test(28, 5), None);
        assert_eq!(cs.hit_test(12, 8), None);
    }

    #[test]
    fn hit_test_overlap_last_wins() {
        let mut cs = ClickState::new();
        cs.add_click_target(Rect::new(0, 5, 80, 1), 1);
        cs.add_click_target(Rect::new(5, 5, 10, 1), 2);

        assert_eq!(cs.hit_test(7, 5), Some(2));
        assert_eq!(cs.hit_test(0, 5), Some(1));
        assert_eq!(cs.hit_test(20, 5), Some(1));
    }

    #[test]
    fn empty_rects_are_not_registered() {
        let mut cs = ClickState::new();
        cs.add_click_target(Rect::new(0, 0, 0, 3), 1);
        cs.add_click_target(Rect::new(0, 0, 3, 0), 2);
        assert!(cs.targets.is_empty());
    }

    #[test]
    fn add_row_target_respects_area() {
        let mut cs = ClickState::new();
        let area = Rect::new(5, 10, 30, 5);
        cs.add_row_target(area, 9, 97);
        cs.add_row_target(area, 12, 98);
        cs.add_row_target(area, 15, 99);

        assert_eq!(cs.targets.len(), 1);
        assert_eq!(cs.hit_test(15, 12), Some(98));
        assert_eq!(cs.hit_test(4, 12), None);
    }

    #[test]
    fn clear_removes_everything() {
        let mut cs = ClickState::new();
        cs.add_click_target(Rect::new(0, 1, 80, 1), 1);
        cs.clear_targets();
        assert_eq!(cs.hit_test(0, 1), None);
    }

    #[test]
    fn narrow_layout_threshold() {
        assert!(is_narrow_layout(59));
        assert!(!is_narrow_layout(60));
    }

    // ── pixel conversion ───────────────────────────────────────────

    #[test]
    fn pixel_to_row_and_col() {
        assert_eq!(pixel_y_to_row(0.0, 450.0, 30), Some(0));
        assert_eq!(pixel_y_to_row(15.0, 450.0, 30), Some(1));
        assert_eq!(pixel_y_to_row(449.0, 450.0, 30), Some(29));
        assert_eq!(pixel_y_to_row(450.0, 450.0, 30), None);
        assert_eq!(pixel_y_to_row(-1.0, 450.0, 30), None);
        assert_eq!(pixel_y_to_row(10.0, 0.0, 30), None);

        assert_eq!(pixel_x_to_col(10.0, 800.0, 80), Some(1));
        assert_eq!(pixel_x_to_col(800.0, 800.0, 80), None);
        assert_eq!(pixel_x_to_col(5.0, 800.0, 0), None);
    }

    #[test]
    fn tap_on_keypad_cell_resolves_action() {
        let mut cs = ClickState::new();
        cs.terminal_cols = 40;
        cs.terminal_rows = 30;
        cs.add_click_target(Rect::new(8, 20, 8, 3), 105);

        // 10px x 15px cells
        let (col, row) = pixel_to_cell(12.0 * 10.0 + 3.0, 21.0 * 15.0 + 7.0, 400.0, 450.0, &cs)
            .unwrap();
        assert_eq!((col, row), (12, 21));
        assert_eq!(cs.hit_test(col, row), Some(105));
        assert_eq!(pixel_to_cell(401.0, 10.0, 400.0, 450.0, &cs), None);
    }
}
