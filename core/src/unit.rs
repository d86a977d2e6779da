//! Scheduled-unit trait and activation cadence.
//!
//! RULE: Every periodic piece of simulation implements ScheduledUnit.
//! The scheduler calls tick() on each registered unit in registration
//! order, every tick. The unit decides from its Cadence whether this
//! tick is its activation point.

use crate::{
    error::SimResult,
    event::SimEvent,
    store::SaveStore,
    types::Tick,
    world::GameWorld,
};
use std::any::Any;

/// Everything a unit may touch while activating.
/// Lent by the host for the duration of one `Scheduler::update`.
pub struct TickContext<'a> {
    pub world:  &'a mut GameWorld,
    pub saves:  &'a mut dyn SaveStore,
    pub events: &'a mut Vec<SimEvent>,
}

impl<'a> TickContext<'a> {
    pub fn new(
        world: &'a mut GameWorld,
        saves: &'a mut dyn SaveStore,
        events: &'a mut Vec<SimEvent>,
    ) -> Self {
        Self { world, saves, events }
    }

    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }
}

/// When a unit last fired and when it fires next.
///
/// Invariant: `next_tick == last_tick + activation_rate`, re-established
/// on every firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    activation_rate: u64,
    last_tick:       Tick,
    next_tick:       Tick,
}

impl Cadence {
    /// A cadence anchored at `current_tick`; first firing is one period later.
    ///
    /// A rate of 0 is accepted with a warning and fires every tick.
    pub fn new(activation_rate: u64, current_tick: Tick) -> Self {
        if activation_rate < 1 {
            log::warn!("activation rate {activation_rate} < 1; unit will fire every tick");
        }
        Self {
            activation_rate,
            last_tick: current_tick,
            next_tick: current_tick + activation_rate,
        }
    }

    pub fn activation_rate(&self) -> u64 { self.activation_rate }
    pub fn last_tick(&self) -> Tick { self.last_tick }
    pub fn next_tick(&self) -> Tick { self.next_tick }

    /// Due on or after the scheduled tick. A skipped-over unit fires
    /// once on the next tick that reaches it; missed periods are dropped.
    pub fn is_due(&self, current_tick: Tick) -> bool {
        current_tick >= self.next_tick
    }

    /// Re-anchor the schedule at `current_tick`.
    pub fn rebase(&mut self, current_tick: Tick) {
        self.last_tick = current_tick;
        self.next_tick = current_tick + self.activation_rate;
    }
}

/// The contract every scheduled unit must fulfill.
pub trait ScheduledUnit {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    fn cadence(&self) -> &Cadence;

    fn cadence_mut(&mut self) -> &mut Cadence;

    /// The extension point. Called only on due ticks.
    fn activate(&mut self, _tick: Tick, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        Ok(())
    }

    /// Called by the scheduler on every tick. Returns whether the unit fired.
    ///
    /// The schedule re-bases even when activation fails, so a broken
    /// unit keeps its cadence instead of retrying every tick.
    fn tick(&mut self, current_tick: Tick, ctx: &mut TickContext<'_>) -> SimResult<bool> {
        if !self.cadence().is_due(current_tick) {
            return Ok(false);
        }
        let result = self.activate(current_tick, ctx);
        self.cadence_mut().rebase(current_tick);
        result.map(|()| true)
    }

    /// For downcasting by the scheduler, tests and tooling.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
