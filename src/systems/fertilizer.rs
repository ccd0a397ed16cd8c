use rand::RngCore;

use crate::{
    engine::{System, TurnContext},
    plot::Plot,
};

pub struct FertilizerSystem;

impl FertilizerSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FertilizerSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FertilizerSystem {
    fn name(&self) -> &str {
        "fertilizer"
    }

    fn run(&mut self, _ctx: &TurnContext<'_>, plots: &mut [Plot], _rng: &mut dyn RngCore) {
        for plot in plots.iter_mut().filter(|plot| plot.is_planted()) {
            plot.fertilizer_effect = plot.fertilizer_effect.saturating_sub(1);
        }
    }
}
