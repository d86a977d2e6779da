//! Save games — full world state to/from JSON in a save slot.
//!
//! The payload is opaque to the units that trigger saves. Only this
//! module knows its shape.

use crate::{
    error::{SimError, SimResult},
    store::SaveStore,
    types::Tick,
    world::GameWorld,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveGame {
    pub tick:     Tick,
    pub saved_at: chrono::DateTime<chrono::Utc>,
    pub world:    GameWorld,
}

/// Serialize `world` into slot `key`, overwriting whatever was there.
pub fn save_game(
    store: &mut dyn SaveStore,
    key: &str,
    tick: Tick,
    world: &GameWorld,
) -> SimResult<()> {
    let save = SaveGame {
        tick,
        saved_at: chrono::Utc::now(),
        world: world.clone(),
    };
    let json = serde_json::to_string(&save)?;
    store.put(key, &json)?;
    log::debug!("Game saved to '{key}' at tick {tick}");
    Ok(())
}

pub fn load_game(store: &dyn SaveStore, key: &str) -> SimResult<SaveGame> {
    let json = store
        .get(key)?
        .ok_or_else(|| SimError::SaveNotFound { key: key.to_string() })?;
    Ok(serde_json::from_str(&json)?)
}
