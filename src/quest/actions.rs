//! Semantic action IDs for Math Quest click targets.

// ── Profile picker ───────────────────────────────────────────
pub const SELECT_USER_BASE: u16 = 10; // +index into USERS

// ── Home (mission setup) ─────────────────────────────────────
pub const TOGGLE_OP_BASE: u16 = 20; // +Operation::index()
pub const TOGGLE_TABLE_BASE: u16 = 30; // +table (1..=12)
pub const DIFFICULTY_BASE: u16 = 50; // +index into Difficulty::ALL
pub const TOGGLE_MODE: u16 = 60;
pub const LAUNCH: u16 = 70;
pub const OPEN_COLLECTION: u16 = 71;
pub const OPEN_STATS: u16 = 72;
pub const SWITCH_USER: u16 = 73;

// ── Game ─────────────────────────────────────────────────────
pub const DIGIT_BASE: u16 = 100; // +digit 0..9
pub const DELETE_DIGIT: u16 = 110;
pub const CHOICE_BASE: u16 = 120; // +choice index 0..3
pub const END_PRACTICE: u16 = 130;
pub const QUIT_GAME: u16 = 131;

// ── Mission report ───────────────────────────────────────────
pub const REWARD_BASE: u16 = 140; // +offer index 0..2
pub const PLAY_AGAIN: u16 = 150;
pub const BACK_TO_BASE: u16 = 151;

// ── Collection / stats ───────────────────────────────────────
pub const BACK: u16 = 160;
pub const SCROLL_UP: u16 = 161;
pub const SCROLL_DOWN: u16 = 162;
