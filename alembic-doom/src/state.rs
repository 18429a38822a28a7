//! Doom game-state schema
//!
//! Deserialized from the engine's game-state log lines. Wire field names
//! follow the engine's JSON exactly (upper-case section keys, camelCase
//! leaves, and the engine's own weapon/monster spellings).

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use alembic_core::domain::PromptReady;

/// Prefix the engine puts in front of every game-state log line
const LOG_PREFIX: &str = "[GS] GAMESTATE ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponName {
    Fist,
    Chainsaw,
    Pistol,
    Shotgun,
    SuperShotgun,
    Chaingun,
    RocketLauncher,
    #[serde(rename = "Plasma Rifle")]
    PlasmaRifle,
    #[serde(rename = "BFG900")]
    Bfg9000,
    #[serde(rename = "")]
    None,
}

impl WeaponName {
    pub const ALL: [WeaponName; 10] = [
        WeaponName::Fist,
        WeaponName::Chainsaw,
        WeaponName::Pistol,
        WeaponName::Shotgun,
        WeaponName::SuperShotgun,
        WeaponName::Chaingun,
        WeaponName::RocketLauncher,
        WeaponName::PlasmaRifle,
        WeaponName::Bfg9000,
        WeaponName::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponName::Fist => "Fist",
            WeaponName::Chainsaw => "Chainsaw",
            WeaponName::Pistol => "Pistol",
            WeaponName::Shotgun => "Shotgun",
            WeaponName::SuperShotgun => "SuperShotgun",
            WeaponName::Chaingun => "Chaingun",
            WeaponName::RocketLauncher => "RocketLauncher",
            WeaponName::PlasmaRifle => "Plasma Rifle",
            WeaponName::Bfg9000 => "BFG900",
            WeaponName::None => "",
        }
    }
}

impl fmt::Display for WeaponName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonsterType {
    Zombieman,
    ShotgunGuy,
    #[serde(rename = "DoomImp")]
    Imp,
    Demon,
    Spectre,
    LostSoul,
    Cacodemon,
    BaronOfHell,
    Cyberdemon,
    SpiderMastermind,
}

impl MonsterType {
    pub const ALL: [MonsterType; 10] = [
        MonsterType::Zombieman,
        MonsterType::ShotgunGuy,
        MonsterType::Imp,
        MonsterType::Demon,
        MonsterType::Spectre,
        MonsterType::LostSoul,
        MonsterType::Cacodemon,
        MonsterType::BaronOfHell,
        MonsterType::Cyberdemon,
        MonsterType::SpiderMastermind,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MonsterType::Zombieman => "Zombieman",
            MonsterType::ShotgunGuy => "ShotgunGuy",
            MonsterType::Imp => "DoomImp",
            MonsterType::Demon => "Demon",
            MonsterType::Spectre => "Spectre",
            MonsterType::LostSoul => "LostSoul",
            MonsterType::Cacodemon => "Cacodemon",
            MonsterType::BaronOfHell => "BaronOfHell",
            MonsterType::Cyberdemon => "Cyberdemon",
            MonsterType::SpiderMastermind => "SpiderMastermind",
        }
    }
}

impl fmt::Display for MonsterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AimedAtType {
    Actor,
    Monster,
    Wall,
    Ceiling,
    Floor,
    Unknown,
}

impl AimedAtType {
    pub const ALL: [AimedAtType; 6] = [
        AimedAtType::Actor,
        AimedAtType::Monster,
        AimedAtType::Wall,
        AimedAtType::Ceiling,
        AimedAtType::Floor,
        AimedAtType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AimedAtType::Actor => "Actor",
            AimedAtType::Monster => "Monster",
            AimedAtType::Wall => "Wall",
            AimedAtType::Ceiling => "Ceiling",
            AimedAtType::Floor => "Floor",
            AimedAtType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AimedAtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundCheck {
    pub is_sprinting: bool,
    pub terrain_type: String,
    pub obstacle_distance: f64,
    pub floor_height_ahead: f64,
    pub player_floor_height: f64,
    pub height_difference: f64,
    pub is_jumpable: bool,
    pub is_in_air: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AimedAt {
    pub entity_type: AimedAtType,
    pub distance: f64,
    pub interactable: bool,
    pub horizontal_angle: f64,
    pub vertical_angle: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub monster_type: MonsterType,
    pub monster_mass: i64,
    pub monster_health: i64,
    pub distance: f64,
    pub relative_angle: f64,
    pub relative_pitch: f64,
    #[serde(rename = "inFOV")]
    pub in_fov: bool,
    pub screen_x: f64,
    pub screen_y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySlot {
    pub index: u32,
    pub weapon_name: WeaponName,
    pub ammo_count: i64,
    pub can_use: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub current_slot: usize,
    pub inventory_slots: Vec<InventorySlot>,
}

/// One snapshot of the game as the engine logged it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    #[serde(rename = "AIMED_AT")]
    pub aimed_at: AimedAt,
    #[serde(rename = "MONSTERS")]
    pub monsters: Vec<Monster>,
    #[serde(rename = "INVENTORY")]
    pub inventory: Inventory,
    #[serde(rename = "GROUND_CHECK")]
    pub ground_check: GroundCheck,
}

impl GameState {
    /// Parses one engine log line.
    ///
    /// Returns `None` for lines that are not game-state records; a
    /// matching line with a malformed payload is skipped with a warning
    /// rather than aborting the whole log scan.
    pub fn from_log_line(line: &str) -> Option<Self> {
        let payload = line.strip_prefix(LOG_PREFIX)?;
        match serde_json::from_str(payload) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(error = %e, "skipping malformed game-state line");
                None
            }
        }
    }

    /// The inventory slot currently wielded, if the index is valid
    pub fn current_slot(&self) -> Option<&InventorySlot> {
        self.inventory.inventory_slots.get(self.inventory.current_slot)
    }
}

impl PromptReady for GameState {
    /// Renders the snapshot as compact indented text.
    ///
    /// Only decision-relevant fields survive: ground checks, aim angles,
    /// monster mass/FOV/screen coordinates and unusable inventory slots
    /// are dropped to keep the payload small.
    fn to_prompt_text(&self) -> String {
        let mut lines = Vec::new();

        lines.push("AIMED_AT:".to_string());
        lines.push(format!("  type: {}", self.aimed_at.entity_type));
        lines.push(format!("  distance: {:.2}", self.aimed_at.distance));
        lines.push(format!(
            "  interactable: {}",
            if self.aimed_at.interactable { "yes" } else { "no" }
        ));
        lines.push(String::new());

        lines.push(format!("MONSTERS (count={}):", self.monsters.len()));
        for monster in &self.monsters {
            lines.push(format!(
                "  - ({}, {}, {:.2}, {:.2}, {:.2})",
                monster.monster_type,
                monster.monster_health,
                monster.distance,
                monster.relative_angle,
                monster.relative_pitch
            ));
        }
        lines.push(String::new());

        lines.push("INVENTORY:".to_string());
        lines.push(format!("  current_slot: {}", self.inventory.current_slot));
        lines.push("  weapons:".to_string());
        for slot in &self.inventory.inventory_slots {
            if !slot.can_use {
                continue;
            }
            lines.push(format!(
                "    - ({}, {}, {})",
                slot.index, slot.weapon_name, slot.ammo_count
            ));
        }

        lines.join("\n")
    }
}
