//! Rotating autosaves.
//!
//! Slots are named `autosave1`, `autosave2`, ... with slot 1 always the
//! newest. Each activation keeps the `limit` newest existing autosaves,
//! shifts them one slot down and writes a fresh save into slot 1.

use crate::{
    error::SimResult,
    event::SimEvent,
    snapshot::save_game,
    store::SaveStore,
    types::Tick,
    unit::{Cadence, ScheduledUnit, TickContext},
};

pub const AUTOSAVE_PREFIX: &str = "autosave";

pub fn autosave_key(slot: usize) -> String {
    format!("{AUTOSAVE_PREFIX}{slot}")
}

/// Slot index of an autosave key. `None` for anything else.
pub fn autosave_slot(key: &str) -> Option<usize> {
    key.strip_prefix(AUTOSAVE_PREFIX)?
        .parse::<usize>()
        .ok()
        .filter(|slot| *slot >= 1)
}

/// Existing autosave keys, newest (lowest slot) first.
pub fn existing_autosaves(store: &dyn SaveStore) -> SimResult<Vec<String>> {
    let mut slots: Vec<(usize, String)> = store
        .keys()?
        .into_iter()
        .filter_map(|key| autosave_slot(&key).map(|slot| (slot, key)))
        .collect();
    slots.sort();
    Ok(slots.into_iter().map(|(_, key)| key).collect())
}

pub struct AutosaveUnit {
    cadence:   Cadence,
    /// How many older autosaves survive a rotation, not counting the
    /// fresh one written to slot 1. At most `limit + 1` slots remain.
    pub limit: usize,
}

impl AutosaveUnit {
    pub fn new(activation_rate: u64, current_tick: Tick, limit: usize) -> Self {
        Self {
            cadence: Cadence::new(activation_rate, current_tick),
            limit,
        }
    }

    /// Shift retained autosaves down one slot and drop the rest.
    /// Returns how many old autosaves were kept.
    fn rotate(&self, store: &mut dyn SaveStore) -> SimResult<usize> {
        let existing = existing_autosaves(store)?;
        let retained = existing.len().min(self.limit);

        // Read everything before writing: targets overlap sources.
        let mut payloads = Vec::with_capacity(retained);
        for key in &existing[..retained] {
            if let Some(payload) = store.get(key)? {
                payloads.push(payload);
            }
        }

        for (index, payload) in payloads.iter().enumerate().rev() {
            store.put(&autosave_key(index + 2), payload)?;
        }

        let occupied = payloads.len() + 1;
        for key in &existing {
            let rewritten = autosave_slot(key)
                .is_some_and(|slot| slot <= occupied && *key == autosave_key(slot));
            if !rewritten {
                store.remove(key)?;
            }
        }

        let discarded = existing.len() - payloads.len();
        if discarded > 0 {
            log::debug!("autosave: discarded {discarded} old autosave(s)");
        }
        Ok(payloads.len())
    }
}

impl ScheduledUnit for AutosaveUnit {
    fn name(&self) -> &'static str { "autosave" }

    fn cadence(&self) -> &Cadence { &self.cadence }

    fn cadence_mut(&mut self) -> &mut Cadence { &mut self.cadence }

    fn activate(&mut self, tick: Tick, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let retained = self.rotate(ctx.saves)?;
        let slot = autosave_key(1);
        save_game(ctx.saves, &slot, tick, ctx.world)?;

        log::info!("tick={tick} autosave: wrote '{slot}', kept {retained} older");
        ctx.emit(SimEvent::AutosaveWritten { tick, slot, retained });
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any { self }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
}
