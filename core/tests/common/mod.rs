//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use citytick_core::{
    clock::ManualClock,
    config::SchedulerConfig,
    error::{SimError, SimResult},
    event::SimEvent,
    scheduler::Scheduler,
    store::SaveStore,
    types::Tick,
    unit::{Cadence, ScheduledUnit, TickContext},
    world::GameWorld,
};
use std::cell::RefCell;
use std::rc::Rc;

pub type FireLog = Rc<RefCell<Vec<(Tick, &'static str)>>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One second per tick at speed 1, max speed 5.
pub fn scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        base_tick_ms: 1000,
        max_speed:    5,
        start_speed:  1,
    }
}

pub fn manual_scheduler() -> (Scheduler, ManualClock) {
    init_logging();
    let clock = ManualClock::new();
    let scheduler = Scheduler::new(&scheduler_config(), Box::new(clock.clone()))
        .expect("valid scheduler config");
    (scheduler, clock)
}

/// Records every tick it fires on.
pub struct Recorder {
    cadence: Cadence,
    label:   &'static str,
    log:     FireLog,
    fail:    bool,
}

impl Recorder {
    pub fn new(label: &'static str, rate: u64, current_tick: Tick, log: &FireLog) -> Self {
        Self {
            cadence: Cadence::new(rate, current_tick),
            label,
            log: Rc::clone(log),
            fail: false,
        }
    }

    /// Records, then reports failure.
    pub fn failing(label: &'static str, rate: u64, current_tick: Tick, log: &FireLog) -> Self {
        Self { fail: true, ..Self::new(label, rate, current_tick, log) }
    }
}

impl ScheduledUnit for Recorder {
    fn name(&self) -> &'static str { self.label }

    fn cadence(&self) -> &Cadence { &self.cadence }

    fn cadence_mut(&mut self) -> &mut Cadence { &mut self.cadence }

    fn activate(&mut self, tick: Tick, _ctx: &mut TickContext<'_>) -> SimResult<()> {
        self.log.borrow_mut().push((tick, self.label));
        if self.fail {
            return Err(SimError::Other(anyhow::anyhow!("{} exploded", self.label)));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any { self }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
}

pub fn fired_ticks(log: &FireLog, label: &str) -> Vec<Tick> {
    log.borrow()
        .iter()
        .filter(|(_, l)| *l == label)
        .map(|(t, _)| *t)
        .collect()
}

/// Call a unit's activate hook directly, outside any scheduler.
pub fn activate_once(
    unit: &mut dyn ScheduledUnit,
    tick: Tick,
    world: &mut GameWorld,
    saves: &mut dyn SaveStore,
) -> SimResult<Vec<SimEvent>> {
    let mut events = Vec::new();
    let mut ctx = TickContext::new(world, saves, &mut events);
    unit.activate(tick, &mut ctx)?;
    Ok(events)
}
