//! citytick-core: the fixed-timestep tick scheduler and the periodic
//! units that drive the city simulation.

pub mod autosave_unit;
pub mod calendar_unit;
pub mod clock;
pub mod command;
pub mod config;
pub mod delayed_action_unit;
pub mod error;
pub mod event;
pub mod profit_unit;
pub mod scheduler;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod unit;
pub mod world;
