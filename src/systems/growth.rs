use rand::RngCore;

use crate::{
    engine::{System, TurnContext},
    plot::{Plot, MATURE_STAGE, SEEDLING_STAGE},
};

/// Moves planted crops one stage towards maturity. Mature crops wait for
/// the player; nothing is harvested automatically.
pub struct GrowthSystem;

impl GrowthSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GrowthSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for GrowthSystem {
    fn name(&self) -> &str {
        "growth"
    }

    fn run(&mut self, _ctx: &TurnContext<'_>, plots: &mut [Plot], _rng: &mut dyn RngCore) {
        for plot in plots.iter_mut().filter(|plot| plot.is_planted()) {
            if (SEEDLING_STAGE..MATURE_STAGE).contains(&plot.growth_stage) {
                plot.growth_stage += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{environment::EventFlags, plot::Crop, scenario::Rules};
    use rand::rngs::mock::StepRng;

    fn grow(plots: &mut [Plot]) {
        let rules = Rules::default();
        let ctx = TurnContext::new(EventFlags::default(), &rules);
        GrowthSystem::new().run(&ctx, plots, &mut StepRng::new(0, 0));
    }

    #[test]
    fn stages_advance_until_mature() {
        let mut plots = vec![Plot::new(0)];
        plots[0].plant(Crop::Corn);
        for expected in 2..=5 {
            grow(&mut plots);
            assert_eq!(plots[0].growth_stage, expected);
        }
        grow(&mut plots);
        assert_eq!(plots[0].growth_stage, 5);
    }

    #[test]
    fn empty_plots_do_not_grow() {
        let mut plots = vec![Plot::new(0)];
        grow(&mut plots);
        assert_eq!(plots[0].growth_stage, 0);
    }
}
