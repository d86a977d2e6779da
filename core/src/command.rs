use serde::{Deserialize, Serialize};

/// Player-issued scheduler controls.
/// Queued with `Scheduler::submit` and applied at the start of the next
/// update, or applied at once with `Scheduler::apply`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ControlCommand {
    TogglePause,
    IncrementSpeed,
    DecrementSpeed,
    /// The speed control's raw value. 0 pauses.
    SpeedControl { value: u32 },
}
