use crate::{calendar_unit::GameDate, error::SimError, types::Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Real milliseconds per tick at speed 1.
    pub base_tick_ms: u64,
    /// Highest speed the speed control accepts.
    pub max_speed:    u32,
    pub start_speed:  u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_tick_ms: 1000,
            max_speed:    5,
            start_speed:  1,
        }
    }
}

impl SchedulerConfig {
    pub fn base_tick_seconds(&self) -> f64 {
        self.base_tick_ms as f64 / 1000.0
    }

    /// Reject settings the scheduler cannot run with. A zero tick
    /// would make the catch-up loop spin forever.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.base_tick_ms == 0 {
            return Err(SimError::Config("base_tick_ms must be > 0".to_string()));
        }
        if self.max_speed == 0 {
            return Err(SimError::Config("max_speed must be > 0".to_string()));
        }
        if self.start_speed > self.max_speed {
            return Err(SimError::Config(format!(
                "start_speed {} exceeds max_speed {}",
                self.start_speed, self.max_speed
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnitsConfig {
    pub profit_rate:         Tick,
    pub profit_target_type:  String,
    pub calendar_rate:       Tick,
    pub start_date:          GameDate,
    pub delayed_action_rate: Tick,
    pub autosave_rate:       Tick,
    pub autosave_limit:      usize,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            profit_rate:         1,
            profit_target_type:  "fastfood".to_string(),
            calendar_rate:       1,
            start_date:          GameDate::default(),
            delayed_action_rate: 1,
            autosave_rate:       60,
            autosave_limit:      3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub scheduler: SchedulerConfig,
    pub units:     UnitsConfig,
}

impl SimConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config = Self::from_json(&content)?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.scheduler.validate()
    }
}
