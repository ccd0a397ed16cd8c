use rand::RngCore;

use crate::{
    engine::{System, TurnContext},
    plot::Plot,
};

pub struct DryingSystem;

impl DryingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DryingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DryingSystem {
    fn name(&self) -> &str {
        "drying"
    }

    fn run(&mut self, ctx: &TurnContext<'_>, plots: &mut [Plot], _rng: &mut dyn RngCore) {
        let rate = if ctx.flags.heatwave {
            ctx.rules.heatwave_drying_rate
        } else {
            ctx.rules.drying_rate
        };
        for plot in plots.iter_mut().filter(|plot| plot.is_planted()) {
            plot.set_soil_moisture(plot.soil_moisture - rate);
        }
    }
}
