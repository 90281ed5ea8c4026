//! Reusable clickable UI components.
//!
//! Each component encapsulates both rendering and click target registration,
//! so visual output and interactive behaviour stay co-located.
//!
//! - [`ClickableList`]: vertical list with per-row click targets.
//! - [`ButtonGrid`]: rows of boxed buttons (keypad, answer choices, toggles).

use ratzilla::ratatui::layout::{Alignment, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::Line;
use ratzilla::ratatui::widgets::{Block, Borders, Paragraph};
use ratzilla::ratatui::Frame;

use crate::input::ClickState;

// ── ClickableList ──────────────────────────────────────────────

/// A builder that pairs rendered [`Line`]s with click actions.
///
/// Annotate lines as clickable while building, then call
/// [`register_targets`](ClickableList::register_targets) once to bind every
/// action to the row its line ended up on.
///
/// # Example
/// ```ignore
/// let mut cl = ClickableList::new();
/// cl.push(Line::from("Header (not clickable)"));
/// cl.push_clickable(Line::from("[S] Stats"), OPEN_STATS);
/// cl.register_targets_with_block(area, &block, &mut cs, 0, 0);
/// f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
/// ```
#[derive(Default)]
pub struct ClickableList<'a> {
    lines: Vec<Line<'a>>,
    /// `(line_index, action_id)` pairs.
    actions: Vec<(u16, u16)>,
}

impl<'a> ClickableList<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Line<'a>) {
        self.lines.push(line);
    }

    /// Add a clickable line. The action follows the line if rows are
    /// inserted before it.
    pub fn push_clickable(&mut self, line: Line<'a>, action_id: u16) {
        let idx = self.lines.len() as u16;
        self.actions.push((idx, action_id));
        self.lines.push(line);
    }

    pub fn into_lines(self) -> Vec<Line<'a>> {
        self.lines
    }

    /// Register click targets for all clickable lines.
    ///
    /// * `top_offset` / `bottom_offset`: rows taken by borders.
    /// * `scroll`: vertical scroll offset in visual rows.
    /// * `inner_width`: content width for wrap calculation; `0` when the
    ///   widget does not wrap (one logical line per row).
    pub fn register_targets(
        &self,
        area: Rect,
        cs: &mut ClickState,
        top_offset: u16,
        bottom_offset: u16,
        scroll: u16,
        inner_width: u16,
    ) {
        let content_y = area.y + top_offset;
        let content_end = area.y + area.height.saturating_sub(bottom_offset);

        let w = inner_width as usize;
        let mut visual_starts: Vec<u16> = Vec::with_capacity(self.lines.len());
        let mut visual_heights: Vec<u16> = Vec::with_capacity(self.lines.len());
        let mut cumulative: u16 = 0;
        for line in &self.lines {
            visual_starts.push(cumulative);
            let lw = line.width();
            let h = if w == 0 || lw <= w {
                1
            } else {
                lw.div_ceil(w) as u16
            };
            visual_heights.push(h);
            cumulative += h;
        }

        for &(line_idx, action_id) in &self.actions {
            let li = line_idx as usize;
            if li >= self.lines.len() {
                continue;
            }
            for r in 0..visual_heights[li] {
                let vr = visual_starts[li] + r;
                if vr < scroll {
                    continue;
                }
                let screen_row = content_y + (vr - scroll);
                if screen_row >= content_end {
                    break;
                }
                cs.add_row_target(area, screen_row, action_id);
            }
        }
    }

    /// Like [`register_targets`](Self::register_targets) with the border
    /// offsets taken from `block`.
    pub fn register_targets_with_block(
        &self,
        area: Rect,
        block: &Block,
        cs: &mut ClickState,
        scroll: u16,
        inner_width: u16,
    ) {
        let inner = block.inner(area);
        let top = inner.y.saturating_sub(area.y);
        let bottom = (area.y + area.height).saturating_sub(inner.y + inner.height);
        self.register_targets(area, cs, top, bottom, scroll, inner_width);
    }
}

// ── ButtonGrid ─────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Button {
    pub label: String,
    pub style: Style,
    pub action_id: u16,
}

impl Button {
    pub fn new(label: impl Into<String>, action_id: u16) -> Self {
        Self {
            label: label.into(),
            style: Style::default().fg(Color::White),
            action_id,
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Highlight as the selected option.
    pub fn selected(self, on: bool) -> Self {
        if on {
            self.style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            self
        }
    }
}

/// Rows of equally sized bordered buttons, each its own click target.
///
/// # Example
/// ```ignore
/// ButtonGrid::new(3)
///     .row(vec![Button::new("7", DIGIT_BASE + 7), ...])
///     .render(f, area, &mut cs);
/// ```
pub struct ButtonGrid {
    rows: Vec<Vec<Button>>,
    row_height: u16,
}

impl ButtonGrid {
    pub fn new(row_height: u16) -> Self {
        Self {
            rows: Vec::new(),
            row_height: row_height.max(1),
        }
    }

    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    pub fn height(&self) -> u16 {
        self.rows.len() as u16 * self.row_height
    }

    /// Cell rectangles for every button, row-major. Rows that do not fit in
    /// `area` are dropped.
    pub fn layout(&self, area: Rect) -> Vec<Vec<Rect>> {
        let mut out = Vec::with_capacity(self.rows.len());
        for (r, row) in self.rows.iter().enumerate() {
            let y = area.y + r as u16 * self.row_height;
            if row.is_empty() || y + self.row_height > area.y + area.height {
                break;
            }
            let n = row.len() as u16;
            let base = area.width / n;
            let extra = area.width % n;
            let mut x = area.x;
            let mut rects = Vec::with_capacity(row.len());
            for i in 0..n {
                // Leftover columns go to the first cells.
                let w = base + u16::from(i < extra);
                rects.push(Rect::new(x, y, w, self.row_height));
                x += w;
            }
            out.push(rects);
        }
        out
    }

    pub fn render(self, f: &mut Frame, area: Rect, cs: &mut ClickState) {
        let layout = self.layout(area);
        for (row, rects) in self.rows.into_iter().zip(layout) {
            for (button, rect) in row.into_iter().zip(rects) {
                let borders = if rect.height >= 3 {
                    Borders::ALL
                } else {
                    Borders::NONE
                };
                let block = Block::default()
                    .borders(borders)
                    .border_style(Style::default().fg(Color::DarkGray));
                let widget = Paragraph::new(Line::from(button.label))
                    .style(button.style)
                    .alignment(Alignment::Center)
                    .block(block);
                f.render_widget(widget, rect);
                cs.add_click_target(rect, button.action_id);
            }
        }
    }
}
