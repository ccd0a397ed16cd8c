//! Player actions on the selected plot.
//!
//! Rejections are silent: an action that cannot apply returns `None` and the
//! caller keeps its session unchanged.

use serde::{Deserialize, Serialize};

use crate::plot::{Crop, HEALTH_MAX};
use crate::scenario::Rules;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Plant,
    Water,
    Fertilize,
    PestControl,
    Harvest,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Plant => "plant",
            ActionKind::Water => "water",
            ActionKind::Fertilize => "fertilize",
            ActionKind::PestControl => "pestControl",
            ActionKind::Harvest => "harvest",
        }
    }

    pub fn levels(self) -> &'static [ActionLevel] {
        match self {
            ActionKind::Plant | ActionKind::Harvest => &[ActionLevel::Standard],
            ActionKind::Water => &[ActionLevel::Light, ActionLevel::Moderate, ActionLevel::Heavy],
            ActionKind::Fertilize => &[ActionLevel::Cheap, ActionLevel::Premium],
            ActionKind::PestControl => &[ActionLevel::Basic, ActionLevel::Advanced],
        }
    }

    pub fn default_level(self) -> ActionLevel {
        self.levels()[0]
    }

    pub fn accepts(self, level: ActionLevel) -> bool {
        self.levels().contains(&level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionLevel {
    Standard,
    Light,
    Moderate,
    Heavy,
    Cheap,
    Premium,
    Basic,
    Advanced,
}

impl ActionLevel {
    pub fn label(self) -> &'static str {
        match self {
            ActionLevel::Standard => "standard",
            ActionLevel::Light => "light",
            ActionLevel::Moderate => "moderate",
            ActionLevel::Heavy => "heavy",
            ActionLevel::Cheap => "cheap",
            ActionLevel::Premium => "premium",
            ActionLevel::Basic => "basic",
            ActionLevel::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub level: ActionLevel,
    pub cost: u32,
}

impl ActionRequest {
    pub fn new(kind: ActionKind, level: ActionLevel, cost: u32) -> Self {
        Self { kind, level, cost }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Success,
    Warning,
    Info,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub money: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pest_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harvest: Option<u32>,
}

/// Feedback for the player about an accepted action. Not part of the
/// session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub action: ActionKind,
    pub message: String,
    pub changes: Changes,
}

/// Applies `request` to the selected plot and returns the next session with
/// the feedback record, or `None` when the action is rejected.
pub fn apply(
    session: &Session,
    request: &ActionRequest,
    rules: &Rules,
) -> Option<(Session, ActionResult)> {
    if session.complete
        || session.money < i64::from(request.cost)
        || !request.kind.accepts(request.level)
    {
        return None;
    }
    let index = session.selected_plot?;
    let before = session.plots.get(index)?;
    let number = index + 1;
    let level = request.level;
    let mut plot = before.clone();
    let mut next = session.clone();
    let mut kind = ResultKind::Success;
    let mut changes = Changes::default();

    let message = match request.kind {
        ActionKind::Plant => {
            if plot.is_planted() {
                return None;
            }
            plot.plant(Crop::Corn);
            changes.health = Some(plot.health - before.health);
            format!("Planted {} on plot #{number}.", Crop::Corn.label())
        }
        ActionKind::Water => {
            let gain = match level {
                ActionLevel::Light => rules.water_light,
                ActionLevel::Moderate => rules.water_moderate,
                ActionLevel::Heavy => rules.water_heavy,
                _ => return None,
            };
            if !plot.is_planted() {
                return None;
            }
            plot.set_soil_moisture(plot.soil_moisture + gain);
            changes.moisture = Some(plot.soil_moisture - before.soil_moisture);
            if plot.soil_moisture - rules.optimal_moisture > rules.moisture_tolerance {
                kind = ResultKind::Warning;
                format!(
                    "Plot #{number} is waterlogged at {:.0}% moisture.",
                    plot.soil_moisture * 100.0
                )
            } else {
                format!(
                    "Watered plot #{number} ({}): moisture now {:.0}%.",
                    level.label(),
                    plot.soil_moisture * 100.0
                )
            }
        }
        ActionKind::Fertilize => {
            let (boost, weeks) = match level {
                ActionLevel::Cheap => (rules.fertilizer_cheap_health, rules.fertilizer_cheap_weeks),
                ActionLevel::Premium => (
                    rules.fertilizer_premium_health,
                    rules.fertilizer_premium_weeks,
                ),
                _ => return None,
            };
            if !plot.is_planted() {
                return None;
            }
            if before.health >= HEALTH_MAX {
                kind = ResultKind::Info;
            }
            plot.set_health(plot.health + boost);
            plot.fertilizer_effect = weeks;
            changes.health = Some(plot.health - before.health);
            format!(
                "Applied {} fertilizer to plot #{number}; the boost lasts {weeks} weeks.",
                level.label()
            )
        }
        ActionKind::PestControl => {
            let reduction = match level {
                ActionLevel::Basic => rules.pest_control_basic,
                ActionLevel::Advanced => rules.pest_control_advanced,
                _ => return None,
            };
            if !plot.is_planted() {
                return None;
            }
            plot.set_pest_level(plot.pest_level - reduction);
            changes.pest_level = Some(plot.pest_level - before.pest_level);
            format!(
                "Sprayed plot #{number} ({}): pests down to {:.0}%.",
                level.label(),
                plot.pest_level
            )
        }
        ActionKind::Harvest => {
            if !plot.is_harvestable() {
                return None;
            }
            let value = plot.harvest_value(rules.harvest_max_value);
            plot.clear_crop();
            next.plots[index] = plot;
            next.money += i64::from(value);
            next.total_harvested += 1;
            let kind = if value < rules.harvest_max_value / 2 {
                ResultKind::Warning
            } else {
                ResultKind::Success
            };
            let result = ActionResult {
                kind,
                action: ActionKind::Harvest,
                message: format!("Harvested plot #{number} for ${value}."),
                changes: Changes {
                    money: Some(i64::from(value)),
                    harvest: Some(value),
                    ..Changes::default()
                },
            };
            return Some((next, result));
        }
    };

    next.plots[index] = plot;
    next.money -= i64::from(request.cost);
    changes.money = Some(-i64::from(request.cost));
    Some((
        next,
        ActionResult {
            kind,
            action: request.kind,
            message,
            changes,
        },
    ))
}
