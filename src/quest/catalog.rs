//! Static game data: player profiles, collectible blocks, difficulty
//! presets and session modes.

use serde::{Deserialize, Serialize};

// ── Users ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Boy,
    Girl,
}

#[derive(Debug, PartialEq, Eq)]
pub struct User {
    pub id: &'static str,
    pub name: &'static str,
    /// Glyph shown next to the name on the profile picker.
    pub avatar: &'static str,
    pub gender: Gender,
}

pub static USERS: [User; 2] = [
    User {
        id: "jake",
        name: "Jake",
        avatar: "👦",
        gender: Gender::Boy,
    },
    User {
        id: "jeanie",
        name: "Jeanie",
        avatar: "👧",
        gender: Gender::Girl,
    },
];

pub fn find_user(id: &str) -> Option<&'static User> {
    USERS.iter().find(|u| u.id == id)
}

// ── Blocks ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn label(self) -> &'static str {
        match self {
            Rarity::Common => "COMMON",
            Rarity::Rare => "RARE",
            Rarity::Epic => "EPIC",
            Rarity::Legendary => "LEGENDARY",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct BlockDef {
    pub kind: &'static str,
    pub name: &'static str,
    pub rarity: Rarity,
}

pub static BLOCKS: [BlockDef; 11] = [
    BlockDef { kind: "grass", name: "Grass Block", rarity: Rarity::Common },
    BlockDef { kind: "diamond", name: "Diamond Ore", rarity: Rarity::Legendary },
    BlockDef { kind: "gold", name: "Gold Ore", rarity: Rarity::Rare },
    BlockDef { kind: "tnt", name: "TNT", rarity: Rarity::Epic },
    BlockDef { kind: "obsidian", name: "Obsidian", rarity: Rarity::Epic },
    BlockDef { kind: "crafting_table", name: "Crafting Table", rarity: Rarity::Common },
    BlockDef { kind: "water", name: "Water", rarity: Rarity::Common },
    BlockDef { kind: "powder_snow", name: "Powder Snow", rarity: Rarity::Rare },
    BlockDef { kind: "sticky_piston", name: "Sticky Piston", rarity: Rarity::Rare },
    BlockDef { kind: "redstone_lamp", name: "Redstone Lamp", rarity: Rarity::Rare },
    BlockDef { kind: "dried_kelp", name: "Dried Kelp Block", rarity: Rarity::Common },
];

pub fn find_block(kind: &str) -> Option<&'static BlockDef> {
    BLOCKS.iter().find(|b| b.kind == kind)
}

// ── Difficulty ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Cadet,
    Pilot,
    Commander,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Cadet, Difficulty::Pilot, Difficulty::Commander];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Cadet => "Cadet",
            Difficulty::Pilot => "Pilot",
            Difficulty::Commander => "Commander",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Difficulty::Cadet => "Numbers 1-5",
            Difficulty::Pilot => "Numbers 1-9",
            Difficulty::Commander => "Numbers 1-12",
        }
    }

    /// Highest table included by the preset.
    pub fn max_table(self) -> u32 {
        match self {
            Difficulty::Cadet => 5,
            Difficulty::Pilot => 9,
            Difficulty::Commander => 12,
        }
    }

    pub fn tables(self) -> Vec<u32> {
        (1..=self.max_table()).collect()
    }

    pub fn parse(s: &str) -> Option<Difficulty> {
        Difficulty::ALL
            .iter()
            .copied()
            .find(|d| d.label().eq_ignore_ascii_case(s.trim()))
    }
}

// ── Mode ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    TimeAttack,
    Practice,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::TimeAttack => "time-attack",
            Mode::Practice => "practice",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::TimeAttack => "Time Attack (60s)",
            Mode::Practice => "Practice (no timer)",
        }
    }

    pub fn parse(s: &str) -> Option<Mode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time-attack" | "timeattack" | "challenge" => Some(Mode::TimeAttack),
            "practice" => Some(Mode::Practice),
            _ => None,
        }
    }

    pub fn toggled(self) -> Mode {
        match self {
            Mode::TimeAttack => Mode::Practice,
            Mode::Practice => Mode::TimeAttack,
        }
    }
}
