//! The tick scheduler — the heart of the simulation.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Delayed actions
//!   2. Profit accrual
//!   3. Calendar
//!   4. Autosave
//!
//! RULES:
//!   - Units are ticked in registration order, every tick.
//!   - Every tick number is visited exactly once, one at a time,
//!     even when a stalled host makes the catch-up loop run many.
//!   - Nothing in the tick path is fatal: a failing unit is logged
//!     and the remaining units still run.
//!   - While paused the clock is stopped and no time accrues.

use crate::{
    autosave_unit::AutosaveUnit,
    calendar_unit::CalendarUnit,
    clock::ClockSource,
    command::ControlCommand,
    config::{SchedulerConfig, SimConfig},
    delayed_action_unit::{DelayedAction, DelayedActionRegistry},
    error::{SimError, SimResult},
    event::SimEvent,
    profit_unit::ProfitUnit,
    store::SaveStore,
    types::{Tick, UnitName},
    unit::{ScheduledUnit, TickContext},
    world::GameWorld,
};
use std::collections::VecDeque;

pub struct Scheduler {
    clock:                Box<dyn ClockSource>,
    /// Seconds per tick at speed 1.
    base_tick_time:       f64,
    tick_duration:        f64,
    tick_number:          Tick,
    accumulated:          f64,
    paused:               bool,
    speed:                u32,
    speed_before_pausing: u32,
    max_speed:            u32,
    units:                Vec<(UnitName, Box<dyn ScheduledUnit>)>,
    commands:             VecDeque<ControlCommand>,
    outbox:               Vec<SimEvent>,
}

impl Scheduler {
    /// Fails on a config the catch-up loop cannot run with.
    pub fn new(config: &SchedulerConfig, clock: Box<dyn ClockSource>) -> SimResult<Self> {
        config.validate()?;
        let base_tick_time = config.base_tick_seconds();
        let mut scheduler = Self {
            clock,
            base_tick_time,
            tick_duration: base_tick_time,
            tick_number: 0,
            accumulated: 0.0,
            paused: false,
            speed: 1,
            speed_before_pausing: 1,
            max_speed: config.max_speed,
            units: Vec::new(),
            commands: VecDeque::new(),
            outbox: Vec::new(),
        };
        scheduler.clock.start();
        if config.start_speed != 1 {
            scheduler.set_speed(i64::from(config.start_speed));
        }
        scheduler.outbox.clear();
        Ok(scheduler)
    }

    /// Build a scheduler with every game unit registered.
    /// Call this instead of new() + manual add_unit() calls.
    pub fn build(config: &SimConfig, clock: Box<dyn ClockSource>) -> SimResult<Self> {
        let mut scheduler = Scheduler::new(&config.scheduler, clock)?;
        let units = &config.units;
        let now = scheduler.tick_number;

        // EXECUTION ORDER — fixed, documented, never reordered.
        scheduler.add_unit(
            "delayed_actions",
            Box::new(DelayedActionRegistry::new(units.delayed_action_rate, now)),
        );
        scheduler.add_unit(
            "profit",
            Box::new(ProfitUnit::new(units.profit_rate, now, units.profit_target_type.clone())),
        );
        scheduler.add_unit(
            "calendar",
            Box::new(CalendarUnit::new(units.calendar_rate, now, units.start_date)),
        );
        scheduler.add_unit(
            "autosave",
            Box::new(AutosaveUnit::new(units.autosave_rate, now, units.autosave_limit)),
        );
        Ok(scheduler)
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn tick_number(&self) -> Tick { self.tick_number }
    pub fn tick_duration(&self) -> f64 { self.tick_duration }
    pub fn accumulated(&self) -> f64 { self.accumulated }
    pub fn is_paused(&self) -> bool { self.paused }
    pub fn speed(&self) -> u32 { self.speed }
    pub fn speed_before_pausing(&self) -> u32 { self.speed_before_pausing }
    pub fn max_speed(&self) -> u32 { self.max_speed }

    pub fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|(name, _)| name.as_str()).collect()
    }

    // ── Units ──────────────────────────────────────────────────

    /// Register a unit. A name already in use is replaced in place:
    /// the newcomer keeps the old activation position but brings its
    /// own schedule.
    pub fn add_unit(&mut self, name: impl Into<UnitName>, unit: Box<dyn ScheduledUnit>) {
        let name = name.into();
        match self.units.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => {
                log::warn!("Replacing unit '{name}' ({})", unit.name());
                slot.1 = unit;
            }
            None => {
                log::debug!("Registered unit '{name}' ({})", unit.name());
                self.units.push((name, unit));
            }
        }
    }

    pub fn unit(&self, name: &str) -> Option<&dyn ScheduledUnit> {
        self.units
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, unit)| &**unit)
    }

    /// First registered unit of concrete type `T`.
    pub fn find_unit<T: 'static>(&self) -> Option<&T> {
        self.units
            .iter()
            .find_map(|(_, unit)| unit.as_any().downcast_ref::<T>())
    }

    pub fn find_unit_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.units
            .iter_mut()
            .find_map(|(_, unit)| unit.as_any_mut().downcast_mut::<T>())
    }

    // ── Delayed actions ────────────────────────────────────────

    /// Queue `action` on the delayed-action registry, `delay_ticks` after
    /// the registry's last activation. Returns the due tick.
    pub fn request_delayed_action(
        &mut self,
        delay_ticks: Tick,
        action: DelayedAction,
    ) -> SimResult<Tick> {
        let registry = self
            .find_unit_mut::<DelayedActionRegistry>()
            .ok_or_else(|| SimError::UnitNotFound { name: "delayed_actions".to_string() })?;
        Ok(registry.request(delay_ticks, action))
    }

    // ── Speed and pause ────────────────────────────────────────

    /// Change speed. Above `max_speed` is ignored; 0 or below pauses.
    ///
    /// The tick fraction already banked survives the change: going
    /// from speed 1 to 2 quarters both the tick duration and the
    /// accumulated time.
    pub fn set_speed(&mut self, speed: i64) {
        if speed > i64::from(self.max_speed) {
            log::debug!("Ignoring speed {speed} above max {}", self.max_speed);
            return;
        }
        if speed <= 0 {
            self.pause();
            return;
        }
        if self.paused {
            self.un_pause(None);
        }

        let speed = speed as u32;
        let fraction = self.accumulated / self.tick_duration;
        self.tick_duration = self.base_tick_time / f64::from(speed).powi(2);
        self.accumulated = fraction * self.tick_duration;
        self.speed = speed;

        log::info!("Speed set to {speed} ({:.4}s per tick)", self.tick_duration);
        self.outbox.push(SimEvent::SpeedChanged { tick: self.tick_number, speed });
    }

    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.speed_before_pausing = self.speed;
        self.speed = 0;
        self.clock.stop();
        self.paused = true;

        log::info!("Paused at tick {}", self.tick_number);
        self.outbox.push(SimEvent::Paused { tick: self.tick_number });
        self.outbox.push(SimEvent::SpeedChanged { tick: self.tick_number, speed: 0 });
    }

    /// Resume, optionally at a new speed.
    pub fn un_pause(&mut self, resume_speed: Option<i64>) {
        if self.paused {
            self.clock.start();
            self.paused = false;
            self.speed = self.speed_before_pausing;

            log::info!("Resumed at tick {}", self.tick_number);
            self.outbox.push(SimEvent::Resumed { tick: self.tick_number });
        }
        if let Some(speed) = resume_speed {
            self.set_speed(speed);
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.un_pause(Some(i64::from(self.speed_before_pausing)));
        } else {
            self.pause();
        }
    }

    // ── Commands ───────────────────────────────────────────────

    /// Queue a command for the start of the next update.
    pub fn submit(&mut self, command: ControlCommand) {
        self.commands.push_back(command);
    }

    /// Apply a command immediately.
    pub fn apply(&mut self, command: ControlCommand) {
        log::debug!("Applying {command:?}");
        match command {
            ControlCommand::TogglePause => self.toggle_pause(),
            ControlCommand::IncrementSpeed => self.set_speed(i64::from(self.speed) + 1),
            ControlCommand::DecrementSpeed => self.set_speed(i64::from(self.speed) - 1),
            ControlCommand::SpeedControl { value: 0 } => self.pause(),
            ControlCommand::SpeedControl { value } => self.set_speed(i64::from(value)),
        }
    }

    // ── Ticking ────────────────────────────────────────────────

    /// Called once per host frame. Drains queued commands, banks the
    /// clock's elapsed time and runs every whole tick it covers.
    ///
    /// Returns the events published since the previous update.
    pub fn update(&mut self, world: &mut GameWorld, saves: &mut dyn SaveStore) -> Vec<SimEvent> {
        while let Some(command) = self.commands.pop_front() {
            self.apply(command);
        }

        let mut events = std::mem::take(&mut self.outbox);
        if self.paused {
            return events;
        }

        self.accumulated += self.clock.delta();
        let mut ctx = TickContext::new(world, saves, &mut events);
        while self.accumulated >= self.tick_duration {
            self.accumulated -= self.tick_duration;
            self.run_tick(&mut ctx);
        }
        events
    }

    /// Run `ticks` ticks back to back without consulting the clock.
    /// Used by tooling and tests to fast-forward. No-op while paused.
    pub fn fast_forward(
        &mut self,
        ticks: u64,
        world: &mut GameWorld,
        saves: &mut dyn SaveStore,
    ) -> Vec<SimEvent> {
        let mut events = std::mem::take(&mut self.outbox);
        if self.paused {
            return events;
        }
        let mut ctx = TickContext::new(world, saves, &mut events);
        for _ in 0..ticks {
            self.run_tick(&mut ctx);
        }
        events
    }

    fn run_tick(&mut self, ctx: &mut TickContext<'_>) {
        self.tick_number += 1;
        let tick = self.tick_number;
        for (name, unit) in self.units.iter_mut() {
            match unit.tick(tick, ctx) {
                Ok(true) => log::trace!("tick={tick} unit '{name}' fired"),
                Ok(false) => {}
                Err(e) => log::error!("tick={tick} unit '{name}' failed: {e}"),
            }
        }
    }
}
