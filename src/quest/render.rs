//! Math Quest rendering (read-only from state).

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Local;
use ratzilla::ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratzilla::ratatui::Frame;

use crate::input::{is_narrow_layout, ClickState};
use crate::widgets::{Button, ButtonGrid, ClickableList};

use super::actions::*;
use super::catalog::{Difficulty, Gender, Mode, Rarity, BLOCKS, USERS};
use super::logic::{seconds_left, shows_streak_badge};
use super::problem::{Operation, ALL_TABLES};
use super::state::{Feedback, QuestState, Screen, Session};

pub fn render(
    state: &QuestState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    if state.user.is_none() {
        render_user_select(f, area, click_state);
        return;
    }
    match state.screen {
        Screen::UserSelect => render_user_select(f, area, click_state),
        Screen::Home => render_home(state, f, area, click_state),
        Screen::Game => render_game(state, f, area, click_state),
        Screen::Report => render_report(state, f, area, click_state),
        Screen::Collection => render_collection(state, f, area, click_state),
        Screen::Stats => render_stats(state, f, area, click_state),
    }
}

fn borders_for(area: Rect) -> Borders {
    if is_narrow_layout(area.width) {
        Borders::TOP | Borders::BOTTOM
    } else {
        Borders::ALL
    }
}

fn titled_block(title: &str, color: Color, borders: Borders) -> Block<'_> {
    Block::default()
        .borders(borders)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
}

fn key_hint(key: &str, label: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(" [{key}] "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(label.to_string(), Style::default().fg(Color::White)),
    ])
}

fn rarity_color(rarity: Rarity) -> Color {
    match rarity {
        Rarity::Common => Color::Gray,
        Rarity::Rare => Color::Cyan,
        Rarity::Epic => Color::Magenta,
        Rarity::Legendary => Color::Yellow,
    }
}

/// Grid buttons lose their borders when the screen is too short for them.
fn button_row_height(area: Rect, rows_needed: u16) -> u16 {
    if area.height >= rows_needed * 3 + 16 {
        3
    } else {
        1
    }
}

fn render_notice(state: &QuestState, f: &mut Frame, area: Rect) {
    if let Some(notice) = &state.notice {
        let widget = Paragraph::new(Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(Color::Red),
        )))
        .wrap(Wrap { trim: true });
        f.render_widget(widget, area);
    }
}

// ── User select ────────────────────────────────────────────────────────

fn render_user_select(f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
    let block = titled_block(" Math Quest ", Color::Green, borders_for(area));

    let mut cl = ClickableList::new();
    cl.push(Line::from(""));
    cl.push(Line::from(Span::styled(
        "  Who's playing today?",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )));
    cl.push(Line::from(""));
    for (i, user) in USERS.iter().enumerate() {
        let color = match user.gender {
            Gender::Boy => Color::LightBlue,
            Gender::Girl => Color::LightMagenta,
        };
        cl.push_clickable(
            Line::from(vec![
                Span::styled(
                    format!(" [{}] ", i + 1),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{} {}", user.avatar, user.name),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]),
            SELECT_USER_BASE + i as u16,
        );
    }
    cl.push(Line::from(""));
    cl.push(Line::from(Span::styled(
        "  Tap a name or press its number.",
        Style::default().fg(Color::DarkGray),
    )));

    let mut cs = click_state.borrow_mut();
    cl.register_targets_with_block(area, &block, &mut cs, 0, 0);
    drop(cs);
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}

// ── Home (mission setup) ───────────────────────────────────────────────

fn render_home(
    state: &QuestState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let is_narrow = is_narrow_layout(area.width);
    let row_h = button_row_height(area, 4);
    let table_rows: u16 = if is_narrow { 3 } else { 2 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                  // Header
            Constraint::Length(1),                  // "Operations"
            Constraint::Length(row_h),              // Operation toggles
            Constraint::Length(1),                  // "Tables"
            Constraint::Length(row_h * table_rows), // Table toggles
            Constraint::Length(row_h),              // Difficulty presets
            Constraint::Length(row_h),              // Mode
            Constraint::Length(6),                  // Menu
            Constraint::Min(1),                     // Notice
        ])
        .split(area);

    render_home_header(state, f, chunks[0]);

    let label = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(" Operations  (m d a s)", label))),
        chunks[1],
    );
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" Tables: {}  (1-9 0 - =)", state.setup.tables_label()),
            label,
        ))),
        chunks[3],
    );

    let setup = &state.setup;
    let mut cs = click_state.borrow_mut();

    let op_buttons: Vec<Button> = Operation::ALL
        .iter()
        .map(|&op| {
            let text = if is_narrow {
                op.symbol().to_string()
            } else {
                format!("{} {}", op.symbol(), op.name())
            };
            Button::new(text, TOGGLE_OP_BASE + op.index() as u16).selected(setup.ops.contains(&op))
        })
        .collect();
    ButtonGrid::new(row_h)
        .row(op_buttons)
        .render(f, chunks[2], &mut cs);

    let per_row = ALL_TABLES.len() / table_rows as usize;
    let mut tables = ButtonGrid::new(row_h);
    for chunk in ALL_TABLES.chunks(per_row) {
        tables = tables.row(
            chunk
                .iter()
                .map(|&t| {
                    Button::new(t.to_string(), TOGGLE_TABLE_BASE + t as u16)
                        .selected(setup.tables.contains(&t))
                })
                .collect(),
        );
    }
    tables.render(f, chunks[4], &mut cs);

    let current = setup.difficulty();
    let presets: Vec<Button> = Difficulty::ALL
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let text = if is_narrow {
                d.label().to_string()
            } else {
                format!("{} · {}", d.label(), d.description())
            };
            Button::new(text, DIFFICULTY_BASE + i as u16).selected(current == Some(d))
        })
        .collect();
    ButtonGrid::new(row_h)
        .row(presets)
        .render(f, chunks[5], &mut cs);

    ButtonGrid::new(row_h)
        .row(vec![Button::new(
            format!("Mode: {}  (t)", setup.mode.label()),
            TOGGLE_MODE,
        )
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))])
        .render(f, chunks[6], &mut cs);

    let mut cl = ClickableList::new();
    cl.push_clickable(
        Line::from(vec![
            Span::styled(
                " [Enter] ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "Launch mission",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        LAUNCH,
    );
    cl.push_clickable(key_hint("b", "Block collection"), OPEN_COLLECTION);
    cl.push_clickable(key_hint("h", "Stats & high scores"), OPEN_STATS);
    cl.push_clickable(key_hint("u", "Switch player"), SWITCH_USER);
    let menu_block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    cl.register_targets_with_block(chunks[7], &menu_block, &mut cs, 0, 0);
    drop(cs);
    f.render_widget(Paragraph::new(cl.into_lines()).block(menu_block), chunks[7]);

    render_notice(state, f, chunks[8]);
}

fn render_home_header(state: &QuestState, f: &mut Frame, area: Rect) {
    let Some(user) = state.user else {
        return;
    };
    let stats = &state.profile.stats;
    let line = Line::from(vec![
        Span::styled(
            format!(" {} {} ", user.avatar, user.name),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" Today: {} missions · {} XP ", stats.today_missions, stats.today_xp),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!(" Total XP: {} ", stats.total_xp),
            Style::default().fg(Color::Yellow),
        ),
    ]);
    let block = titled_block(" Mission Control ", Color::Green, borders_for(area));
    f.render_widget(
        Paragraph::new(line).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

// ── Game ───────────────────────────────────────────────────────────────

fn render_game(
    state: &QuestState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let Some(session) = &state.session else {
        return;
    };
    let pad = answer_pad(session, button_row_height(area, 4));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Status
            Constraint::Length(5),            // Problem
            Constraint::Length(pad.height()), // Keypad / choices
            Constraint::Length(3),            // Menu
            Constraint::Min(0),
        ])
        .split(area);

    render_game_status(session, f, chunks[0]);
    render_problem(session, f, chunks[1]);

    let mut cs = click_state.borrow_mut();
    pad.render(f, chunks[2], &mut cs);

    let mut cl = ClickableList::new();
    if session.mode == Mode::Practice {
        cl.push_clickable(key_hint("e", "End practice"), END_PRACTICE);
    }
    cl.push_clickable(key_hint("Esc", "Quit mission"), QUIT_GAME);
    let menu_block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    cl.register_targets_with_block(chunks[3], &menu_block, &mut cs, 0, 0);
    drop(cs);
    f.render_widget(Paragraph::new(cl.into_lines()).block(menu_block), chunks[3]);
}

/// Number keypad, or a 2x2 grid on multiple-choice questions.
fn answer_pad(session: &Session, row_h: u16) -> ButtonGrid {
    let Some(choices) = &session.choices else {
        let digit = |d: u16| Button::new(d.to_string(), DIGIT_BASE + d);
        return ButtonGrid::new(row_h)
            .row(vec![digit(7), digit(8), digit(9)])
            .row(vec![digit(4), digit(5), digit(6)])
            .row(vec![digit(1), digit(2), digit(3)])
            .row(vec![
                Button::new("⌫", DELETE_DIGIT).style(Style::default().fg(Color::Yellow)),
                digit(0),
            ]);
    };

    let buttons: Vec<Button> = choices
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let style = match (session.picked, session.feedback) {
                (Some(p), Some(Feedback::Correct)) if p == i => {
                    Style::default().fg(Color::Black).bg(Color::Green)
                }
                (Some(p), Some(Feedback::Wrong)) if p == i => {
                    Style::default().fg(Color::White).bg(Color::Red)
                }
                _ => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            };
            Button::new(format!("({}) {}", i + 1, value), CHOICE_BASE + i as u16).style(style)
        })
        .collect();
    buttons
        .chunks(2)
        .fold(ButtonGrid::new(row_h), |grid, pair| grid.row(pair.to_vec()))
}

fn render_game_status(session: &Session, f: &mut Frame, area: Rect) {
    let timer = match session.mode {
        Mode::TimeAttack => {
            let secs = seconds_left(session);
            let color = if secs <= 10 { Color::Red } else { Color::White };
            Span::styled(
                format!(" ⏱ {secs}s "),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        }
        Mode::Practice => {
            Span::styled(" Practice ", Style::default().fg(Color::Cyan))
        }
    };
    let mut spans = vec![
        timer,
        Span::styled(
            format!(" Score {} ", session.score),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" Q{} ", session.question),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if shows_streak_badge(session.streak) {
        spans.push(Span::styled(
            format!(" 🔥 {} in a row! ", session.streak),
            Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        ));
    }
    let block = titled_block(" Mission ", Color::Cyan, borders_for(area));
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_problem(session: &Session, f: &mut Frame, area: Rect) {
    let problem_text = if session.choices.is_some() {
        session.problem.display.clone()
    } else {
        let typed = if session.input.is_empty() {
            "_".to_string()
        } else {
            session.input.clone()
        };
        format!("{}{}", session.problem.prompt(), typed)
    };

    let (feedback_text, feedback_style) = match session.feedback {
        Some(Feedback::Correct) => (
            "✔ Correct!".to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Some(Feedback::Wrong) => (
            "✘ Not quite, try again".to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        None if session.choices.is_some() => (
            "Pick an answer".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        None => (
            "Type the answer".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };

    let lines = vec![
        Line::from(Span::styled(
            problem_text,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(feedback_text, feedback_style)),
    ];
    let block = Block::default()
        .borders(borders_for(area))
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center),
        area,
    );
}

// ── Mission report ─────────────────────────────────────────────────────

fn render_report(
    state: &QuestState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let Some(session) = &state.session else {
        return;
    };
    let row_h = button_row_height(area, 2);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),     // Summary
            Constraint::Length(1),     // Reward prompt
            Constraint::Length(row_h), // Reward offers
            Constraint::Length(4),     // Menu
            Constraint::Min(1),        // Notice
        ])
        .split(area);

    let stats = &state.profile.stats;
    let lines = vec![
        Line::from(Span::styled(
            format!(" Score: {}", session.score),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            " Correct: {}   Missed: {}   Best streak: {}",
            session.correct, session.wrong, session.best_streak
        )),
        Line::from(Span::styled(
            format!(" {}", session.setup.details()),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                " Today: {} missions · {} XP    Total: {} missions · {} XP",
                stats.today_missions, stats.today_xp, stats.total_missions, stats.total_xp
            ),
            Style::default().fg(Color::Green),
        )),
    ];
    let block = titled_block(" Mission Complete! ", Color::Yellow, borders_for(area));
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        chunks[0],
    );

    let mut cs = click_state.borrow_mut();
    match session.chosen_reward.and_then(|i| session.rewards.get(i)) {
        Some(block) => {
            f.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(" You collected ", Style::default().fg(Color::White)),
                    Span::styled(
                        block.name,
                        Style::default()
                            .fg(rarity_color(block.rarity))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled("!", Style::default().fg(Color::White)),
                ])),
                chunks[1],
            );
        }
        None => {
            f.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " Choose your reward (1-3):",
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ))),
                chunks[1],
            );
            let offers: Vec<Button> = session
                .rewards
                .iter()
                .enumerate()
                .map(|(i, block)| {
                    Button::new(
                        format!("({}) {} · {}", i + 1, block.name, block.rarity.label()),
                        REWARD_BASE + i as u16,
                    )
                    .style(Style::default().fg(rarity_color(block.rarity)))
                })
                .collect();
            ButtonGrid::new(row_h)
                .row(offers)
                .render(f, chunks[2], &mut cs);
        }
    }

    let mut cl = ClickableList::new();
    cl.push_clickable(key_hint("r", "Play again"), PLAY_AGAIN);
    cl.push_clickable(key_hint("b", "Back to base"), BACK_TO_BASE);
    let menu_block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    cl.register_targets_with_block(chunks[3], &menu_block, &mut cs, 0, 0);
    drop(cs);
    f.render_widget(Paragraph::new(cl.into_lines()).block(menu_block), chunks[3]);

    render_notice(state, f, chunks[4]);
}

// ── Collection ─────────────────────────────────────────────────────────

fn render_collection(
    state: &QuestState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let counts = &state.profile.block_counts;
    let unlocked = BLOCKS
        .iter()
        .filter(|b| counts.get(b.kind).copied().unwrap_or(0) > 0)
        .count();
    let total: u32 = counts.values().sum();

    let mut cl = ClickableList::new();
    cl.push(Line::from(Span::styled(
        format!(" Unlocked {unlocked}/{} · {total} blocks collected", BLOCKS.len()),
        Style::default().fg(Color::Green),
    )));
    cl.push(Line::from(""));
    for block in BLOCKS.iter() {
        let count = counts.get(block.kind).copied().unwrap_or(0);
        let line = if count > 0 {
            Line::from(vec![
                Span::styled(
                    format!(" {:<18}", block.name),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{:<10}", block.rarity.label()),
                    Style::default().fg(rarity_color(block.rarity)),
                ),
                Span::styled(format!("x{count}"), Style::default().fg(Color::Yellow)),
            ])
        } else {
            Line::from(vec![
                Span::styled(format!(" {:<18}", "???"), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<10}", block.rarity.label()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled("locked", Style::default().fg(Color::DarkGray)),
            ])
        };
        cl.push(line);
    }
    cl.push(Line::from(""));
    cl.push_clickable(key_hint("b", "Back"), BACK);

    let block = titled_block(" Block Collection ", Color::Magenta, borders_for(area));
    let mut cs = click_state.borrow_mut();
    cl.register_targets_with_block(area, &block, &mut cs, 0, 0);
    drop(cs);
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}

// ── Stats ──────────────────────────────────────────────────────────────

fn stats_lines(state: &QuestState) -> Vec<Line<'static>> {
    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::DarkGray);
    let profile = &state.profile;
    let stats = &profile.stats;

    let mut lines = vec![
        Line::from(Span::styled(" Today", heading)),
        Line::from(format!(
            "  Missions {}   XP {}",
            stats.today_missions, stats.today_xp
        )),
        Line::from(Span::styled(
            format!(
                "  Games logged today: {} (score {})",
                profile.today.count, profile.today.total_score
            ),
            dim,
        )),
        Line::from(""),
        Line::from(Span::styled(" Overall", heading)),
        Line::from(format!(
            "  Missions {}   XP {}   Blocks {}",
            stats.total_missions,
            stats.total_xp,
            stats.distinct_blocks()
        )),
        Line::from(""),
        Line::from(Span::styled(" Practice by operation", heading)),
    ];
    for op in Operation::ALL {
        let games = profile.overall.breakdown.get(&op).copied().unwrap_or(0);
        lines.push(Line::from(format!(
            "  {} {:<15} {games} games",
            op.symbol(),
            op.name()
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" High scores", heading)));
    if profile.high_scores.is_empty() {
        lines.push(Line::from(Span::styled("  No scores yet", dim)));
    }
    for (i, score) in profile.high_scores.iter().enumerate() {
        lines.push(Line::from(format!(
            "  {:>2}. {:>5}  {:<11} {}",
            i + 1,
            score.score,
            score.mode,
            score.date.with_timezone(&Local).format("%Y-%m-%d")
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Recent missions", heading)));
    if profile.overall.games.is_empty() {
        lines.push(Line::from(Span::styled("  Nothing played yet", dim)));
    }
    for game in profile.overall.games.iter().take(20) {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {} ", game.date.with_timezone(&Local).format("%m-%d %H:%M")),
                dim,
            ),
            Span::styled(
                format!("{:>5} ", game.score),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(game.details.clone()),
        ]));
    }
    lines
}

fn render_stats(
    state: &QuestState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let row_h = button_row_height(area, 1);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(row_h)])
        .split(area);

    let block = titled_block(" Stats ", Color::Cyan, borders_for(area));
    let inner = block.inner(chunks[0]);
    let paragraph = Paragraph::new(stats_lines(state))
        .block(block)
        .wrap(Wrap { trim: false });

    let content_height = paragraph.line_count(inner.width) as u16;
    let max_scroll = content_height.saturating_sub(inner.height);
    state.stats_max_scroll.set(max_scroll);
    let scroll = state.stats_scroll.min(max_scroll);

    f.render_widget(paragraph.scroll((scroll, 0)), chunks[0]);

    let mut cs = click_state.borrow_mut();
    ButtonGrid::new(row_h)
        .row(vec![
            Button::new("▲ (k)", SCROLL_UP),
            Button::new("▼ (j)", SCROLL_DOWN),
            Button::new("Back (b)", BACK).style(Style::default().fg(Color::Cyan)),
        ])
        .render(f, chunks[1], &mut cs);
}
