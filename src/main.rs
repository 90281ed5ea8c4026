mod config;
mod input;
mod logger;
mod quest;
mod storage;
mod time;
mod widgets;

use std::{cell::RefCell, io, rc::Rc};

use config::GameConfig;
use input::{pixel_to_cell, ClickState, InputEvent};
use quest::QuestApp;
use ratzilla::event::{KeyCode, MouseButton, MouseEventKind};
use ratzilla::ratatui::Terminal;
use ratzilla::{DomBackend, WebRenderer};
use storage::Store;
use time::FrameClock;

/// Query the grid container's bounding rect and convert pixel coordinates to a cell.
fn dom_pixel_to_cell(mouse_x: u32, mouse_y: u32, cs: &ClickState) -> Option<(u16, u16)> {
    let window = web_sys::window()?;
    let document = window.document()?;

    // DomBackend creates a <div> as the grid container inside <body>.
    let grid = document.query_selector("body > div").ok()??;
    let rect = grid.get_bounding_client_rect();

    let click_x = mouse_x as f64 - rect.left();
    let click_y = mouse_y as f64 - rect.top();

    let cell = pixel_to_cell(click_x, click_y, rect.width(), rect.height(), cs);
    log::debug!(
        "[INPUT] click pixel:({mouse_x},{mouse_y}) cell:{cell:?} targets:{}",
        cs.targets.len()
    );
    cell
}

fn key_to_input(code: KeyCode) -> Option<InputEvent> {
    match code {
        KeyCode::Char(c) => Some(InputEvent::Key(c.to_ascii_lowercase())),
        KeyCode::Backspace | KeyCode::Delete => Some(InputEvent::Backspace),
        KeyCode::Enter => Some(InputEvent::Enter),
        KeyCode::Esc => Some(InputEvent::Escape),
        KeyCode::Up => Some(InputEvent::Up),
        KeyCode::Down => Some(InputEvent::Down),
        _ => None,
    }
}

fn query_string() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

fn main() -> io::Result<()> {
    console_error_panic_hook::set_once();

    let (config, errors) = GameConfig::from_query(&query_string());
    logger::init(config.log_level);
    for e in &errors {
        log::warn!("[CONFIG] ignored: {e}");
    }

    // Separate streams so record ids don't follow the problem sequence.
    let seed = js_sys::Date::now() as u64;
    let store = Store::open(config.store, seed ^ 0x9e37_79b9_7f4a_7c15);
    log::info!("[STORAGE] backend:{}", store.backend_name());
    let app = Rc::new(RefCell::new(QuestApp::new(&config, store, seed.rotate_left(29))));

    let click_state = Rc::new(RefCell::new(ClickState::new()));
    let backend = DomBackend::new()?;
    let terminal = Terminal::new(backend)?;

    // Mouse/touch click handler
    terminal.on_mouse_event({
        let app = app.clone();
        let click_state = click_state.clone();
        move |mouse_event| {
            if mouse_event.event != MouseEventKind::Pressed
                || mouse_event.button != MouseButton::Left
            {
                return;
            }

            let cs = click_state.borrow();
            if cs.terminal_rows == 0 || cs.terminal_cols == 0 {
                return;
            }
            let Some((col, row)) = dom_pixel_to_cell(mouse_event.x, mouse_event.y, &cs) else {
                return;
            };
            let action = cs.hit_test(col, row);
            drop(cs);

            if let Some(id) = action {
                app.borrow_mut().handle_input(InputEvent::Click(id));
            }
        }
    });

    // Keyboard handler
    terminal.on_key_event({
        let app = app.clone();
        move |key_event| {
            if let Some(event) = key_to_input(key_event.code) {
                app.borrow_mut().handle_input(event);
            }
        }
    });

    let mut clock = FrameClock::new();
    terminal.draw_web({
        let click_state = click_state.clone();
        move |f| {
            let ticks = clock.advance(now_ms());
            app.borrow_mut().tick(ticks);

            let size = f.area();
            {
                let mut cs = click_state.borrow_mut();
                cs.terminal_cols = size.width;
                cs.terminal_rows = size.height;
                cs.clear_targets();
            }

            app.borrow().render(f, size, &click_state);
        }
    });

    Ok(())
}
