use rand::RngCore;

use crate::{
    engine::{System, TurnContext},
    plot::Plot,
    rng::RngExt,
};

/// Pests creep up by a random amount every week, twice as fast in a
/// heatwave.
pub struct PestSystem;

impl PestSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PestSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PestSystem {
    fn name(&self) -> &str {
        "pests"
    }

    fn run(&mut self, ctx: &TurnContext<'_>, plots: &mut [Plot], rng: &mut dyn RngCore) {
        let cap = if ctx.flags.heatwave {
            ctx.rules.heatwave_pest_growth_cap
        } else {
            ctx.rules.pest_growth_cap
        };
        for plot in plots.iter_mut().filter(|plot| plot.is_planted()) {
            let increase = rng.random_f64(0.0, cap);
            plot.set_pest_level(plot.pest_level + increase);
        }
    }
}
