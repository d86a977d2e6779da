//! Delayed actions — run a callback once a future tick arrives.
//!
//! Requests are keyed by absolute tick. Each entry fires once, in
//! insertion order, and is then removed from the registry.

use crate::{
    error::SimResult,
    types::Tick,
    unit::{Cadence, ScheduledUnit, TickContext},
};
use std::collections::BTreeMap;

/// A zero-argument action. An Err is logged and does not stop the batch.
pub type DelayedAction = Box<dyn FnOnce() -> anyhow::Result<()>>;

pub struct DelayedActionRegistry {
    cadence:   Cadence,
    callbacks: BTreeMap<Tick, Vec<DelayedAction>>,
}

impl DelayedActionRegistry {
    pub fn new(activation_rate: u64, current_tick: Tick) -> Self {
        Self {
            cadence:   Cadence::new(activation_rate, current_tick),
            callbacks: BTreeMap::new(),
        }
    }

    /// Queue `action` for `request_tick + delay_ticks`. Returns the due tick.
    pub fn schedule_action(
        &mut self,
        request_tick: Tick,
        delay_ticks: Tick,
        action: DelayedAction,
    ) -> Tick {
        let due_tick = request_tick + delay_ticks;
        if due_tick <= self.cadence.last_tick() {
            log::warn!(
                "delayed action due at tick {due_tick} is not after the registry's last \
                 activation ({}); it will never fire",
                self.cadence.last_tick()
            );
        }
        self.callbacks.entry(due_tick).or_default().push(action);
        due_tick
    }

    /// Queue an infallible closure.
    pub fn schedule<F>(&mut self, request_tick: Tick, delay_ticks: Tick, action: F) -> Tick
    where
        F: FnOnce() + 'static,
    {
        self.schedule_action(
            request_tick,
            delay_ticks,
            Box::new(move || {
                action();
                Ok(())
            }),
        )
    }

    /// Queue a request arriving from outside the tick loop.
    ///
    /// The base tick is this registry's own last activation, not the
    /// scheduler's current tick: every request between two activations
    /// shares the same base.
    pub fn request(&mut self, delay_ticks: Tick, action: DelayedAction) -> Tick {
        let base = self.cadence.last_tick();
        self.schedule_action(base, delay_ticks, action)
    }

    /// Number of actions waiting on `tick`.
    pub fn pending_at(&self, tick: Tick) -> usize {
        self.callbacks.get(&tick).map_or(0, Vec::len)
    }

    /// Ticks that still have actions queued, ascending.
    pub fn pending_ticks(&self) -> Vec<Tick> {
        self.callbacks.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool { self.callbacks.is_empty() }
}

impl ScheduledUnit for DelayedActionRegistry {
    fn name(&self) -> &'static str { "delayed_actions" }

    fn cadence(&self) -> &Cadence { &self.cadence }

    fn cadence_mut(&mut self) -> &mut Cadence { &mut self.cadence }

    fn activate(&mut self, tick: Tick, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        let Some(actions) = self.callbacks.remove(&tick) else {
            return Ok(());
        };
        log::debug!("tick={tick} delayed_actions: running {}", actions.len());
        for (index, action) in actions.into_iter().enumerate() {
            if let Err(e) = action() {
                log::error!("tick={tick} delayed action #{index} failed: {e:#}");
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any { self }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
}
