//! Relevance filter
//!
//! Keeps only snapshots where there is something to command the player
//! about: at least one monster, or an interactable object under the
//! crosshair.

use alembic_core::domain::{Dataset, DatasetTransform};

use crate::state::GameState;

/// Filter transform dropping uninteresting snapshots
pub struct RelevanceFilter;

impl DatasetTransform<GameState> for RelevanceFilter {
    fn transform(&self, input: Dataset<GameState>) -> Dataset<GameState> {
        Dataset::from_items(
            input
                .into_iter()
                .filter(|state| !state.monsters.is_empty() || state.aimed_at.interactable),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AimedAt, AimedAtType, GameState, GroundCheck, Inventory, Monster, MonsterType};

    fn base_state() -> GameState {
        GameState {
            aimed_at: AimedAt {
                entity_type: AimedAtType::Wall,
                distance: 500.0,
                interactable: false,
                horizontal_angle: 0.0,
                vertical_angle: 0.0,
            },
            monsters: Vec::new(),
            inventory: Inventory {
                current_slot: 0,
                inventory_slots: Vec::new(),
            },
            ground_check: GroundCheck {
                is_sprinting: false,
                terrain_type: "normal".to_string(),
                obstacle_distance: 0.0,
                floor_height_ahead: 0.0,
                player_floor_height: 0.0,
                height_difference: 0.0,
                is_jumpable: false,
                is_in_air: false,
            },
        }
    }

    fn with_monster(mut state: GameState) -> GameState {
        state.monsters.push(Monster {
            monster_type: MonsterType::Imp,
            monster_mass: 100,
            monster_health: 60,
            distance: 300.0,
            relative_angle: 0.0,
            relative_pitch: 0.0,
            in_fov: true,
            screen_x: 0.5,
            screen_y: 0.5,
        });
        state
    }

    #[test]
    fn keeps_states_with_monsters_or_interactables() {
        let mut interactable = base_state();
        interactable.aimed_at.interactable = true;

        let dataset = Dataset::from_items([
            base_state(),                // dropped
            with_monster(base_state()),  // kept
            interactable,                // kept
        ]);

        let filtered = dataset.apply(&RelevanceFilter);
        assert_eq!(filtered.len(), 2);
        assert!(!filtered.get(0).unwrap().monsters.is_empty());
        assert!(filtered.get(1).unwrap().aimed_at.interactable);
    }
}
