//! In-game calendar.
//!
//! A stylised calendar: every month has 30 days, every year 12 months.
//! Each activation advances one day.

use crate::{
    error::SimResult,
    event::SimEvent,
    types::Tick,
    unit::{Cadence, ScheduledUnit, TickContext},
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DAYS_PER_MONTH: u32 = 30;
pub const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDate {
    pub year:  u32,
    pub month: u32,
    pub day:   u32,
}

impl GameDate {
    pub fn new(year: u32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

impl Default for GameDate {
    fn default() -> Self {
        Self { year: 2000, month: 1, day: 1 }
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.day, self.month, self.year)
    }
}

/// Receives the new day, month or year value.
pub type DateCallback = Box<dyn FnMut(u32)>;

pub struct CalendarUnit {
    cadence:         Cadence,
    date:            GameDate,
    on_day_change:   Vec<DateCallback>,
    on_month_change: Vec<DateCallback>,
    on_year_change:  Vec<DateCallback>,
}

impl CalendarUnit {
    pub fn new(activation_rate: u64, current_tick: Tick, start: GameDate) -> Self {
        Self {
            cadence:         Cadence::new(activation_rate, current_tick),
            date:            start,
            on_day_change:   Vec::new(),
            on_month_change: Vec::new(),
            on_year_change:  Vec::new(),
        }
    }

    pub fn date(&self) -> GameDate { self.date }

    pub fn on_day_change(&mut self, callback: impl FnMut(u32) + 'static) {
        self.on_day_change.push(Box::new(callback));
    }

    pub fn on_month_change(&mut self, callback: impl FnMut(u32) + 'static) {
        self.on_month_change.push(Box::new(callback));
    }

    pub fn on_year_change(&mut self, callback: impl FnMut(u32) + 'static) {
        self.on_year_change.push(Box::new(callback));
    }

    /// Advance one day and roll months and years over as needed.
    pub fn advance_day(&mut self) {
        self.date.day += 1;
        fire(&mut self.on_day_change, self.date.day);
        self.normalize();
    }

    /// Each overflow step fires its callbacks once, day → month → year.
    fn normalize(&mut self) {
        loop {
            if self.date.day > DAYS_PER_MONTH {
                self.date.day -= DAYS_PER_MONTH;
                self.date.month += 1;
                fire(&mut self.on_month_change, self.date.month);
            }
            if self.date.month > MONTHS_PER_YEAR {
                self.date.month -= MONTHS_PER_YEAR;
                self.date.year += 1;
                fire(&mut self.on_year_change, self.date.year);
            }
            if self.date.day <= DAYS_PER_MONTH && self.date.month <= MONTHS_PER_YEAR {
                break;
            }
        }
    }
}

fn fire(callbacks: &mut [DateCallback], value: u32) {
    for callback in callbacks.iter_mut() {
        callback(value);
    }
}

impl ScheduledUnit for CalendarUnit {
    fn name(&self) -> &'static str { "calendar" }

    fn cadence(&self) -> &Cadence { &self.cadence }

    fn cadence_mut(&mut self) -> &mut Cadence { &mut self.cadence }

    fn activate(&mut self, tick: Tick, ctx: &mut TickContext<'_>) -> SimResult<()> {
        self.advance_day();
        log::debug!("tick={tick} calendar: {}", self.date);
        ctx.emit(SimEvent::DateChanged {
            tick,
            display: self.date.to_string(),
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any { self }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
}
