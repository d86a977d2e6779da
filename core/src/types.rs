//! Shared primitive types used across the entire simulation.

/// A simulation tick. The scheduler's unit of time.
pub type Tick = u64;

/// A stable, unique identifier for any entity in the game world.
pub type EntityId = String;

/// Registration name of a scheduled unit.
pub type UnitName = String;
