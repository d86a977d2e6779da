use crate::{
    error::SimResult,
    event::SimEvent,
    types::Tick,
    unit::{Cadence, ScheduledUnit, TickContext},
};

/// Pays every player the precomputed profit of their content of one type.
pub struct ProfitUnit {
    cadence:         Cadence,
    pub target_type: String,
}

impl ProfitUnit {
    pub fn new(activation_rate: u64, current_tick: Tick, target_type: impl Into<String>) -> Self {
        Self {
            cadence:     Cadence::new(activation_rate, current_tick),
            target_type: target_type.into(),
        }
    }
}

impl ScheduledUnit for ProfitUnit {
    fn name(&self) -> &'static str { "profit" }

    fn cadence(&self) -> &Cadence { &self.cadence }

    fn cadence_mut(&mut self) -> &mut Cadence { &mut self.cadence }

    fn activate(&mut self, tick: Tick, ctx: &mut TickContext<'_>) -> SimResult<()> {
        let mut total = 0.0;
        for player in ctx.world.players.iter_mut() {
            let profits: Vec<f64> = player
                .content_of_type(&self.target_type)
                .iter()
                .map(|item| item.modified_profit)
                .collect();
            for profit in profits {
                player.add_money(profit);
                total += profit;
            }
        }

        log::debug!(
            "tick={tick} profit: paid {total:.2} across {} players for '{}'",
            ctx.world.players.len(),
            self.target_type
        );

        ctx.emit(SimEvent::UiRefreshRequested { tick });
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any { self }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
}
