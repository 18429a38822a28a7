//! Game-state perturbation
//!
//! Enlarges a dataset with jittered variants of each snapshot: monster
//! positions wobble (unless the player is aiming at one, which would
//! change the tactical meaning) and ammunition counts drift. The labels
//! elicited for a variant still apply to the situation, so the dataset
//! gains coverage without new gameplay.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use alembic_core::knowledge::Perturbator;

use crate::state::{AimedAtType, GameState};

const MONSTER_VARIANTS: usize = 2;
const AMMO_VARIANTS: usize = 2;
const DROP_PROBABILITY: f64 = 0.3;

/// Minimum plausible monster distance after jitter
const MIN_MONSTER_DISTANCE: f64 = 25.0;

/// Gaussian jitter applied with probability `probability`, scaled
/// relative to the value's magnitude
fn jitter(rng: &mut impl Rng, value: f64, probability: f64, delta: f64) -> f64 {
    if rng.random::<f64>() > probability {
        return value;
    }
    let scale = (value.abs() * delta).max(1e-3);
    let noise = Normal::new(0.0, scale)
        .map(|normal| normal.sample(rng))
        .unwrap_or(0.0);
    value + noise
}

/// The perturbed variants of one snapshot
pub fn perturbations(state: &GameState) -> Vec<GameState> {
    let mut rng = rand::rng();
    let mut variants = Vec::new();

    if state.aimed_at.entity_type != AimedAtType::Monster {
        for _ in 0..MONSTER_VARIANTS {
            let mut monsters = Vec::new();
            for monster in &state.monsters {
                if rng.random::<f64>() <= DROP_PROBABILITY {
                    continue;
                }
                let mut monster = monster.clone();
                monster.distance =
                    jitter(&mut rng, monster.distance, 0.7, 0.1).max(MIN_MONSTER_DISTANCE);
                monster.relative_angle = jitter(&mut rng, monster.relative_angle, 0.7, 0.1);
                monster.relative_pitch = jitter(&mut rng, monster.relative_pitch, 0.7, 0.1);
                monsters.push(monster);
            }

            let mut variant = state.clone();
            variant.monsters = monsters;
            variants.push(variant);
        }
    }

    for _ in 0..AMMO_VARIANTS {
        let mut slots = Vec::new();
        for slot in &state.inventory.inventory_slots {
            let mut slot = slot.clone();
            slot.ammo_count = (jitter(&mut rng, slot.ammo_count as f64, 0.7, 0.3).round()
                as i64)
                .max(0);
            slot.can_use = slot.can_use && rng.random::<f64>() > DROP_PROBABILITY;
            slots.push(slot);
        }

        let mut variant = state.clone();
        variant.inventory.inventory_slots = slots;
        variants.push(variant);
    }

    variants
}

/// Perturbator wired with the snapshot jitter
pub fn perturbator() -> Perturbator<GameState> {
    Perturbator::new(Box::new(perturbations))
}
