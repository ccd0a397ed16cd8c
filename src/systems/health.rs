use rand::RngCore;

use crate::{
    engine::{System, TurnContext},
    environment::EventFlags,
    plot::Plot,
    scenario::Rules,
};

/// Net weekly health change of a planted plot. Runs after growth,
/// fertilizer decay and pest growth, so it sees this week's fertilizer
/// and pest values.
pub fn health_delta(plot: &Plot, flags: EventFlags, rules: &Rules) -> f64 {
    let mut delta = 0.0;

    let deficit = (plot.soil_moisture - rules.optimal_moisture).abs();
    if deficit > rules.moisture_tolerance {
        delta -= deficit * rules.moisture_stress_factor;
    } else {
        delta += rules.optimal_moisture_bonus;
    }

    if plot.fertilizer_effect > 0 {
        delta += rules.fertilizer_bonus;
    }

    if plot.pest_level > rules.pest_damage_threshold {
        delta -= (plot.pest_level / 100.0) * rules.pest_damage_factor;
    }

    if flags.severe {
        delta -= rules.severe_event_penalty;
    } else if flags.heatwave || flags.drought {
        delta -= rules.event_penalty;
    }

    delta
}

pub struct HealthSystem;

impl HealthSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HealthSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for HealthSystem {
    fn name(&self) -> &str {
        "health"
    }

    fn run(&mut self, ctx: &TurnContext<'_>, plots: &mut [Plot], _rng: &mut dyn RngCore) {
        for plot in plots.iter_mut().filter(|plot| plot.is_planted()) {
            let delta = health_delta(plot, ctx.flags, ctx.rules);
            plot.set_health(plot.health + delta);
        }
    }
}
