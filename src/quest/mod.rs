//! Math Quest: timed arithmetic missions that earn collectible blocks.

pub mod actions;
pub mod catalog;
pub mod logic;
pub mod problem;
pub mod render;
pub mod state;

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};
use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::Frame;

use crate::config::GameConfig;
use crate::input::{ClickState, InputEvent};
use crate::storage::{stats::local_date, StorageError, Store};

use actions::*;
use catalog::{Difficulty, Mode, User, USERS};
use problem::Operation;
use state::{QuestState, Screen, Setup};

pub struct QuestApp {
    pub state: QuestState,
    store: Store,
    clock: fn() -> DateTime<Utc>,
}

impl QuestApp {
    pub fn new(config: &GameConfig, store: Store, seed: u64) -> Self {
        let mut setup = store
            .load_settings()
            .map(|s| Setup::from_settings(&s))
            .unwrap_or_default();
        config.apply_to(&mut setup);

        let mut state = QuestState::new(seed);
        state.setup = setup;
        let mut app = Self {
            state,
            store,
            clock: Utc::now,
        };

        if let Some(user) = app.store.current_user() {
            log::info!("[QUEST] resuming user:{}", user.id);
            app.state.user = Some(user);
            app.go_home();
        }
        app
    }

    /// Replace the wall clock, e.g. to pin dates in tests.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self.refresh_profile();
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn today(&self) -> NaiveDate {
        local_date(&self.now())
    }

    /// Log a failed storage call and surface it on screen. Play continues.
    fn report<T>(&mut self, result: Result<T, StorageError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("[QUEST] storage error: {e}");
                self.state.notice = Some(format!("Progress not saved: {e}"));
                None
            }
        }
    }

    fn refresh_profile(&mut self) {
        if self.state.user.is_none() {
            return;
        }
        let today = self.today();
        let profile = &mut self.state.profile;
        profile.stats = self.store.user_stats(today);
        profile.block_counts = self.store.block_counts();
        profile.today = self.store.today_stats(today);
        profile.overall = self.store.overall_stats();
        profile.high_scores = self.store.high_scores();
    }

    // ── Input ─────────────────────────────────────────────────────────

    /// Returns true when the event changed state.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        if self.state.user.is_none() && self.state.screen != Screen::UserSelect {
            self.state.screen = Screen::UserSelect;
        }
        let action = match event {
            InputEvent::Click(id) => Some(id),
            other => self.key_action(other),
        };
        match action {
            Some(id) => self.dispatch(id),
            None => false,
        }
    }

    /// Translate a keyboard event into the action the screen's buttons carry.
    fn key_action(&self, event: InputEvent) -> Option<u16> {
        match self.state.screen {
            Screen::UserSelect => match event {
                InputEvent::Key(c) => {
                    let i = c.to_digit(10)?.checked_sub(1)? as usize;
                    (i < USERS.len()).then(|| SELECT_USER_BASE + i as u16)
                }
                _ => None,
            },
            Screen::Home => match event {
                InputEvent::Key(c) => home_key(c),
                InputEvent::Enter => Some(LAUNCH),
                _ => None,
            },
            Screen::Game => {
                let multiple_choice = self
                    .state
                    .session
                    .as_ref()
                    .is_some_and(|s| s.choices.is_some());
                match event {
                    InputEvent::Key('e') => Some(END_PRACTICE),
                    InputEvent::Key(c) => {
                        let d = c.to_digit(10)?;
                        if multiple_choice {
                            (1..=4).contains(&d).then(|| CHOICE_BASE + d as u16 - 1)
                        } else {
                            Some(DIGIT_BASE + d as u16)
                        }
                    }
                    InputEvent::Backspace => Some(DELETE_DIGIT),
                    InputEvent::Escape => Some(QUIT_GAME),
                    _ => None,
                }
            }
            Screen::Report => match event {
                InputEvent::Key(c @ '1'..='3') => Some(REWARD_BASE + (c as u16 - '1' as u16)),
                InputEvent::Key('r') | InputEvent::Enter => Some(PLAY_AGAIN),
                InputEvent::Key('b') | InputEvent::Escape => Some(BACK_TO_BASE),
                _ => None,
            },
            Screen::Collection => match event {
                InputEvent::Key('b') | InputEvent::Escape => Some(BACK),
                _ => None,
            },
            Screen::Stats => match event {
                InputEvent::Key('b') | InputEvent::Escape => Some(BACK),
                InputEvent::Key('k') | InputEvent::Up => Some(SCROLL_UP),
                InputEvent::Key('j') | InputEvent::Down => Some(SCROLL_DOWN),
                _ => None,
            },
        }
    }

    fn dispatch(&mut self, id: u16) -> bool {
        match self.state.screen {
            Screen::UserSelect => match id {
                id if (SELECT_USER_BASE..SELECT_USER_BASE + USERS.len() as u16).contains(&id) => {
                    self.select_user(&USERS[(id - SELECT_USER_BASE) as usize])
                }
                _ => false,
            },
            Screen::Home => self.dispatch_home(id),
            Screen::Game => self.dispatch_game(id),
            Screen::Report => match id {
                id if (REWARD_BASE..REWARD_BASE + logic::REWARD_OFFERS as u16).contains(&id) => {
                    self.claim_reward((id - REWARD_BASE) as usize)
                }
                PLAY_AGAIN => self.launch(),
                BACK_TO_BASE => {
                    self.state.session = None;
                    self.go_home();
                    true
                }
                _ => false,
            },
            Screen::Collection => match id {
                BACK => {
                    self.go_home();
                    true
                }
                _ => false,
            },
            Screen::Stats => match id {
                BACK => {
                    self.go_home();
                    true
                }
                SCROLL_UP => {
                    self.state.stats_scroll = self.state.stats_scroll.saturating_sub(1);
                    true
                }
                SCROLL_DOWN => {
                    let max = self.state.stats_max_scroll.get();
                    self.state.stats_scroll = self.state.stats_scroll.saturating_add(1).min(max);
                    true
                }
                _ => false,
            },
        }
    }

    fn dispatch_home(&mut self, id: u16) -> bool {
        match id {
            id if (TOGGLE_OP_BASE..TOGGLE_OP_BASE + 4).contains(&id) => {
                let op = Operation::ALL[(id - TOGGLE_OP_BASE) as usize];
                self.state.setup.toggle_op(op)
            }
            id if (TOGGLE_TABLE_BASE + 1..=TOGGLE_TABLE_BASE + 12).contains(&id) => {
                self.state.setup.toggle_table((id - TOGGLE_TABLE_BASE) as u32)
            }
            id if (DIFFICULTY_BASE..DIFFICULTY_BASE + Difficulty::ALL.len() as u16)
                .contains(&id) =>
            {
                let difficulty = Difficulty::ALL[(id - DIFFICULTY_BASE) as usize];
                self.state.setup.apply_difficulty(difficulty);
                true
            }
            TOGGLE_MODE => {
                self.state.setup.mode = self.state.setup.mode.toggled();
                true
            }
            LAUNCH => self.launch(),
            OPEN_COLLECTION => {
                self.refresh_profile();
                self.state.screen = Screen::Collection;
                true
            }
            OPEN_STATS => {
                self.refresh_profile();
                self.state.stats_scroll = 0;
                self.state.screen = Screen::Stats;
                true
            }
            SWITCH_USER => {
                self.sign_out();
                true
            }
            _ => false,
        }
    }

    fn dispatch_game(&mut self, id: u16) -> bool {
        if id == QUIT_GAME {
            log::info!("[QUEST] mission abandoned");
            self.state.session = None;
            self.go_home();
            return true;
        }
        let Some(session) = self.state.session.as_mut() else {
            return false;
        };
        match id {
            id if (DIGIT_BASE..DIGIT_BASE + 10).contains(&id) => {
                let before = session.input.len();
                logic::press_digit(session, (id - DIGIT_BASE) as u32).is_some()
                    || session.input.len() != before
            }
            DELETE_DIGIT => {
                logic::press_delete(session);
                true
            }
            id if (CHOICE_BASE..CHOICE_BASE + 4).contains(&id) => {
                logic::select_choice(session, (id - CHOICE_BASE) as usize).is_some()
            }
            END_PRACTICE if session.mode == Mode::Practice => {
                self.complete_session();
                true
            }
            _ => false,
        }
    }

    // ── Transitions ───────────────────────────────────────────────────

    fn go_home(&mut self) {
        self.refresh_profile();
        self.state.screen = Screen::Home;
    }

    fn select_user(&mut self, user: &'static User) -> bool {
        let result = self.store.set_current_user(user.id);
        self.report(result);
        self.state.user = Some(user);
        self.state.notice = None;
        self.go_home();
        true
    }

    fn sign_out(&mut self) {
        let result = self.store.clear_current_user();
        self.report(result);
        if let Some(user) = self.state.user.take() {
            log::info!("[QUEST] signed out user:{}", user.id);
        }
        self.state.session = None;
        self.state.profile = Default::default();
        self.state.screen = Screen::UserSelect;
    }

    fn launch(&mut self) -> bool {
        let settings = self.state.setup.to_settings();
        let result = self.store.save_settings(&settings);
        self.report(result);

        let session = logic::start_session(&self.state.setup, &mut self.state.rng_seed);
        log::info!(
            "[QUEST] mission start mode:{} details:{}",
            session.mode.as_str(),
            session.setup.details()
        );
        self.state.session = Some(session);
        self.state.notice = None;
        self.state.screen = Screen::Game;
        true
    }

    /// End the running session: offer rewards and record the result.
    fn complete_session(&mut self) {
        let Some(session) = self.state.session.as_mut() else {
            return;
        };
        if session.is_finished() {
            return;
        }
        logic::finish_session(session, &mut self.state.rng_seed);
        let score = session.score;
        let mode = session.mode;
        let details = session.setup.details();
        let ops = session.setup.ops.clone();
        log::info!(
            "[QUEST] mission complete score:{score} correct:{} wrong:{} best_streak:{}",
            session.correct,
            session.wrong,
            session.best_streak
        );

        let now = self.now();
        let result = self.store.record_game_complete(score, local_date(&now));
        self.report(result);
        let result = self.store.save_game_to_history(score, mode, &details, &ops, now);
        self.report(result);
        if score > 0 {
            let result = self.store.save_high_score(score, mode, now);
            self.report(result);
        }
        self.refresh_profile();
        self.state.screen = Screen::Report;
    }

    fn claim_reward(&mut self, index: usize) -> bool {
        let Some(session) = self.state.session.as_mut() else {
            return false;
        };
        let Some(block) = logic::choose_reward(session, index) else {
            return false;
        };
        let now = self.now();
        let result = self.store.add_to_inventory(block.kind, now);
        self.report(result);
        let result = self.store.record_block_collected(block.kind, local_date(&now));
        self.report(result);
        log::info!("[QUEST] reward collected block:{}", block.kind);
        self.refresh_profile();
        true
    }

    // ── Frame hooks ───────────────────────────────────────────────────

    pub fn tick(&mut self, delta_ticks: u32) {
        if self.state.screen != Screen::Game || delta_ticks == 0 {
            return;
        }
        let Some(session) = self.state.session.as_mut() else {
            return;
        };
        if logic::tick(session, delta_ticks, &mut self.state.rng_seed) {
            self.complete_session();
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
        render::render(&self.state, f, area, click_state);
    }
}

fn home_key(c: char) -> Option<u16> {
    let op = |op: Operation| Some(TOGGLE_OP_BASE + op.index() as u16);
    match c {
        'm' => op(Operation::Multiply),
        'd' => op(Operation::Divide),
        'a' => op(Operation::Add),
        's' => op(Operation::Subtract),
        '1'..='9' => Some(TOGGLE_TABLE_BASE + (c as u16 - '0' as u16)),
        '0' => Some(TOGGLE_TABLE_BASE + 10),
        '-' => Some(TOGGLE_TABLE_BASE + 11),
        '=' => Some(TOGGLE_TABLE_BASE + 12),
        'c' => Some(DIFFICULTY_BASE),
        'p' => Some(DIFFICULTY_BASE + 1),
        'o' => Some(DIFFICULTY_BASE + 2),
        't' => Some(TOGGLE_MODE),
        ' ' | 'g' => Some(LAUNCH),
        'b' => Some(OPEN_COLLECTION),
        'h' => Some(OPEN_STATS),
        'u' => Some(SWITCH_USER),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStorage, Settings, CURRENT_USER_KEY, SETTINGS_KEY};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn app() -> QuestApp {
        QuestApp::new(&GameConfig::default(), Store::in_memory(99), 1234).with_clock(fixed_now)
    }

    fn signed_in() -> QuestApp {
        let mut app = app();
        assert!(app.handle_input(InputEvent::Key('1')));
        app
    }

    fn answer_current(app: &mut QuestApp) {
        let session = app.state.session.as_ref().unwrap();
        let answer = session.problem.answer;
        match &session.choices {
            Some(choices) => {
                let i = choices.iter().position(|&c| c == answer).unwrap();
                app.handle_input(InputEvent::Click(CHOICE_BASE + i as u16));
            }
            None => {
                for c in answer.to_string().chars() {
                    app.handle_input(InputEvent::Key(c));
                }
            }
        }
    }

    #[test]
    fn starts_on_user_select_without_profile() {
        let app = app();
        assert_eq!(app.state.screen, Screen::UserSelect);
        assert!(app.state.user.is_none());
    }

    #[test]
    fn other_screens_require_a_user() {
        let mut app = app();
        app.state.screen = Screen::Stats;
        assert!(!app.handle_input(InputEvent::Key('b')));
        assert_eq!(app.state.screen, Screen::UserSelect);
    }

    #[test]
    fn selecting_a_user_persists_it() {
        let mut app = app();
        assert!(app.handle_input(InputEvent::Click(SELECT_USER_BASE + 1)));
        assert_eq!(app.state.screen, Screen::Home);
        assert_eq!(app.state.user.map(|u| u.id), Some("jeanie"));
        assert_eq!(app.store.current_user().map(|u| u.id), Some("jeanie"));
    }

    #[test]
    fn resumes_saved_user_and_settings() {
        let mut backend = MemoryStorage::default();
        backend.set(CURRENT_USER_KEY, "jake").unwrap();
        let settings = Settings {
            ops: vec![Operation::Divide],
            tables: vec![3, 4],
            mode: Mode::Practice,
        };
        backend
            .set(SETTINGS_KEY, &serde_json::to_string(&settings).unwrap())
            .unwrap();

        let (config, _) = GameConfig::from_query("?mode=time-attack");
        let app = QuestApp::new(&config, Store::new(Box::new(backend), 5), 5);
        assert_eq!(app.state.screen, Screen::Home);
        assert_eq!(app.state.setup.ops, vec![Operation::Divide]);
        assert_eq!(app.state.setup.tables, vec![3, 4]);
        assert_eq!(app.state.setup.mode, Mode::TimeAttack);
    }

    #[test]
    fn home_keys_edit_setup() {
        let mut app = signed_in();
        assert!(app.handle_input(InputEvent::Key('d')));
        assert!(app.handle_input(InputEvent::Key('c')));
        assert_eq!(
            app.state.setup.ops,
            vec![Operation::Multiply, Operation::Divide]
        );
        assert_eq!(app.state.setup.tables, vec![1, 2, 3, 4, 5]);
        assert!(app.handle_input(InputEvent::Key('=')));
        assert_eq!(app.state.setup.tables, vec![1, 2, 3, 4, 5, 12]);
        assert!(app.handle_input(InputEvent::Key('t')));
        assert_eq!(app.state.setup.mode, Mode::Practice);
        // the only remaining operation cannot be removed
        app.handle_input(InputEvent::Key('m'));
        assert!(!app.handle_input(InputEvent::Key('d')));
    }

    #[test]
    fn launch_saves_settings() {
        let mut app = signed_in();
        app.handle_input(InputEvent::Key('a'));
        assert!(app.handle_input(InputEvent::Enter));
        assert_eq!(app.state.screen, Screen::Game);
        assert_eq!(
            app.store.load_settings().map(|s| s.ops),
            Some(vec![Operation::Multiply, Operation::Add])
        );
    }

    #[test]
    fn practice_session_records_progress() {
        let mut app = signed_in();
        app.handle_input(InputEvent::Key('t'));
        app.handle_input(InputEvent::Enter);
        for _ in 0..4 {
            answer_current(&mut app);
            app.tick(logic::CORRECT_DELAY_TICKS);
        }
        let score = app.state.session.as_ref().unwrap().score;
        assert_eq!(score, 10 + 12 + 14 + 16);

        assert!(app.handle_input(InputEvent::Key('e')));
        assert_eq!(app.state.screen, Screen::Report);

        let history = app.store.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, score);
        assert_eq!(history[0].mode, "practice");
        assert_eq!(app.state.profile.stats.total_missions, 1);
        assert_eq!(app.state.profile.stats.today_xp, score as u64);
        assert_eq!(app.store.high_scores()[0].score, score);
    }

    #[test]
    fn end_key_ignored_in_time_attack() {
        let mut app = signed_in();
        app.handle_input(InputEvent::Enter);
        assert!(!app.handle_input(InputEvent::Key('e')));
        assert_eq!(app.state.screen, Screen::Game);
    }

    #[test]
    fn time_attack_ends_when_clock_runs_out() {
        let mut app = signed_in();
        app.handle_input(InputEvent::Enter);
        app.tick(logic::SESSION_TICKS);
        assert_eq!(app.state.screen, Screen::Report);
        // no points: history only, no high score
        assert_eq!(app.store.history().len(), 1);
        assert!(app.store.high_scores().is_empty());
    }

    #[test]
    fn reward_is_claimed_once() {
        let mut app = signed_in();
        app.handle_input(InputEvent::Enter);
        app.tick(logic::SESSION_TICKS);

        let offered = app.state.session.as_ref().unwrap().rewards[2].kind;
        assert!(app.handle_input(InputEvent::Key('3')));
        assert!(!app.handle_input(InputEvent::Key('1')));
        let inventory = app.store.inventory();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].kind, offered);
        assert_eq!(app.state.profile.block_counts.get(offered), Some(&1));
    }

    #[test]
    fn play_again_and_back_to_base() {
        let mut app = signed_in();
        app.handle_input(InputEvent::Enter);
        app.tick(logic::SESSION_TICKS);
        assert!(app.handle_input(InputEvent::Key('r')));
        assert_eq!(app.state.screen, Screen::Game);
        assert_eq!(app.state.session.as_ref().unwrap().question, 1);

        app.tick(logic::SESSION_TICKS);
        assert!(app.handle_input(InputEvent::Escape));
        assert_eq!(app.state.screen, Screen::Home);
        assert!(app.state.session.is_none());
    }

    #[test]
    fn quitting_mid_game_records_nothing() {
        let mut app = signed_in();
        app.handle_input(InputEvent::Enter);
        answer_current(&mut app);
        assert!(app.handle_input(InputEvent::Escape));
        assert_eq!(app.state.screen, Screen::Home);
        assert!(app.store.history().is_empty());
    }

    #[test]
    fn stats_and_collection_screens() {
        let mut app = signed_in();
        assert!(app.handle_input(InputEvent::Key('h')));
        assert_eq!(app.state.screen, Screen::Stats);
        app.handle_input(InputEvent::Down);
        app.handle_input(InputEvent::Down);
        app.handle_input(InputEvent::Up);
        assert_eq!(app.state.stats_scroll, 1);
        assert!(app.handle_input(InputEvent::Escape));
        assert_eq!(app.state.screen, Screen::Home);

        assert!(app.handle_input(InputEvent::Key('b')));
        assert_eq!(app.state.screen, Screen::Collection);
        assert!(app.handle_input(InputEvent::Click(BACK)));
        assert_eq!(app.state.screen, Screen::Home);
    }

    #[test]
    fn switching_user_signs_out() {
        let mut app = signed_in();
        assert!(app.handle_input(InputEvent::Key('u')));
        assert_eq!(app.state.screen, Screen::UserSelect);
        assert!(app.state.user.is_none());
        assert!(app.store.current_user().is_none());
    }
}
