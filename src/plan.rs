//! Scripted seasons: a YAML list of weeks, each with the actions to take
//! before the week is advanced.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    actions::{ActionKind, ActionLevel, ActionRequest},
    engine::{Engine, TurnOutcome},
    environment::EnvironmentSource,
    report::SeasonReport,
    scenario::PriceList,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub weeks: Vec<PlannedWeek>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannedWeek {
    #[serde(default)]
    pub actions: Vec<PlannedAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannedAction {
    pub plot: usize,
    pub action: ActionKind,
    pub level: Option<ActionLevel>,
    pub cost: Option<u32>,
}

impl PlannedAction {
    /// The request to submit. The level falls back to the action's default
    /// and the cost to the catalogue price.
    pub fn request(&self, prices: &PriceList) -> ActionRequest {
        prices.quote(self.action, self.level, self.cost)
    }
}

impl Plan {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse plan")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file {}", path.display()))?;
        serde_yaml::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Runs `plan` against `engine` from the briefing until the season ends or
/// the plan runs out of weeks.
pub fn replay(
    engine: &mut Engine,
    plan: &Plan,
    source: &dyn EnvironmentSource,
    prices: &PriceList,
) -> SeasonReport {
    engine.start(source);
    for (index, week) in plan.weeks.iter().enumerate() {
        if engine.session().complete {
            break;
        }
        for planned in &week.actions {
            if engine.session().selected_plot != Some(planned.plot)
                && !engine.select_plot(planned.plot)
            {
                debug!(plot = planned.plot, "planned plot does not exist");
                continue;
            }
            let request = planned.request(prices);
            if engine.perform_action(&request).is_none() {
                debug!(
                    week = engine.session().week,
                    plot = planned.plot,
                    action = request.kind.label(),
                    "planned action rejected"
                );
            }
        }
        match engine.advance_week(source) {
            TurnOutcome::SeasonEnded { reason } => {
                info!(plan_week = index + 1, ?reason, "season ended during replay");
                break;
            }
            TurnOutcome::Advanced { .. } | TurnOutcome::Rejected => {}
        }
    }
    engine.report()
}
