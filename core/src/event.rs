//! Notifications the simulation publishes to the host.
//!
//! RULE: The core never calls into the UI. Anything the host must
//! react to (refresh panels, re-render the date, mirror the speed
//! control) is returned from `Scheduler::update` as a SimEvent.

use crate::types::Tick;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Scheduler control ──────────────────────────
    Paused {
        tick: Tick,
    },
    Resumed {
        tick: Tick,
    },
    /// Speed control write-back. 0 while paused.
    SpeedChanged {
        tick:  Tick,
        speed: u32,
    },

    // ── Periodic units ─────────────────────────────
    /// Balances changed; player-facing panels should redraw.
    UiRefreshRequested {
        tick: Tick,
    },
    DateChanged {
        tick:    Tick,
        display: String,
    },
    AutosaveWritten {
        tick:     Tick,
        slot:     String,
        retained: usize,
    },
}
