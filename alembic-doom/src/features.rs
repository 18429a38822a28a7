//! Clustering features
//!
//! Maps a snapshot to the feature vector the clusterer groups on.
//! Continuous quantities are bucketed so that snapshots differing only in
//! noise land in the same cluster.

use std::collections::HashMap;

use alembic_core::knowledge::Clusterer;

use crate::state::{AimedAtType, GameState, MonsterType, WeaponName};

fn one_hot<T: PartialEq + Copy>(value: Option<T>, vocab: &[T]) -> Vec<f32> {
    let mut encoding = vec![0.0; vocab.len()];
    if let Some(value) = value {
        if let Some(position) = vocab.iter().position(|candidate| *candidate == value) {
            encoding[position] = 1.0;
        }
    }
    encoding
}

fn bucket_distance(distance: f64) -> f32 {
    if distance < 256.0 {
        0.0
    } else if distance < 768.0 {
        0.5
    } else {
        1.0
    }
}

fn ammo_status(ammo: i64) -> f32 {
    if ammo == 0 {
        0.0
    } else if ammo < 10 {
        0.33
    } else if ammo < 40 {
        0.66
    } else {
        1.0
    }
}

/// Most frequent monster type; first-seen wins ties
fn dominant_monster_type(state: &GameState) -> Option<MonsterType> {
    let mut counts: HashMap<MonsterType, usize> = HashMap::new();
    for monster in &state.monsters {
        *counts.entry(monster.monster_type).or_default() += 1;
    }

    let best = *counts.values().max()?;
    state
        .monsters
        .iter()
        .map(|monster| monster.monster_type)
        .find(|kind| counts[kind] == best)
}

/// The clustering feature vector of one snapshot
pub fn feature_vector(state: &GameState) -> Vec<f32> {
    let mut features = Vec::new();

    features.push(state.monsters.len() as f32);

    let closest = state
        .monsters
        .iter()
        .map(|monster| monster.distance)
        .fold(f64::INFINITY, f64::min);
    features.push(if closest.is_finite() {
        bucket_distance(closest)
    } else {
        1.0
    });

    features.extend(one_hot(dominant_monster_type(state), &MonsterType::ALL));

    let slot = state.current_slot();
    features.push(ammo_status(slot.map_or(0, |slot| slot.ammo_count)));
    features.extend(one_hot(slot.map(|slot| slot.weapon_name), &WeaponName::ALL));

    features.push(if state.aimed_at.interactable { 1.0 } else { 0.0 });
    features.extend(one_hot(Some(state.aimed_at.entity_type), &AimedAtType::ALL));

    features
}

/// Clusterer wired with the snapshot feature vector
pub fn clusterer() -> Clusterer<GameState> {
    Clusterer::new(Box::new(feature_vector))
}
