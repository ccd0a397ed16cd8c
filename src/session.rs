use serde::{Deserialize, Serialize};

use crate::environment::{EnvironmentSample, FieldConditions};
use crate::plot::{fresh_grid, Plot};

pub const DEFAULT_REGION: &str = "Punjab";
pub const DEFAULT_TOTAL_WEEKS: u32 = 12;
pub const DEFAULT_INITIAL_MONEY: i64 = 5_000;
pub const DEFAULT_GRID_SIZE: usize = 9;

/// Bootstrap parameters fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub region: String,
    pub total_weeks: u32,
    pub initial_money: i64,
    pub grid_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            total_weeks: DEFAULT_TOTAL_WEEKS,
            initial_money: DEFAULT_INITIAL_MONEY,
            grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Active,
    Complete,
}

/// Farm state at the end of one simulated week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    pub week: u32,
    pub date: Option<String>,
    pub money: i64,
    pub planted: usize,
    pub average_health: Option<f64>,
    pub average_moisture: f64,
    pub event: Option<String>,
}

/// One game's state. Transitions build a new value from the previous one;
/// nothing mutates a session that readers can still see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub config: SessionConfig,
    pub week: u32,
    pub money: i64,
    pub selected_plot: Option<usize>,
    pub plots: Vec<Plot>,
    #[serde(rename = "gameComplete")]
    pub complete: bool,
    pub total_harvested: u32,
    pub date: Option<String>,
    pub conditions: Option<FieldConditions>,
    pub latest_sample: Option<EnvironmentSample>,
    pub history: Vec<WeekSummary>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            week: 1,
            money: config.initial_money,
            selected_plot: None,
            plots: fresh_grid(config.grid_size),
            complete: false,
            total_harvested: 0,
            date: None,
            conditions: None,
            latest_sample: None,
            history: Vec::new(),
            config,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.complete {
            Phase::Complete
        } else {
            Phase::Active
        }
    }

    pub fn season_profit(&self) -> i64 {
        self.money - self.config.initial_money
    }

    pub fn planted_count(&self) -> usize {
        self.plots.iter().filter(|plot| plot.is_planted()).count()
    }

    /// Mean health of planted plots; `None` while nothing is planted.
    pub fn sustainability_score(&self) -> Option<f64> {
        let planted = self.planted_count();
        if planted == 0 {
            return None;
        }
        let total: f64 = self
            .plots
            .iter()
            .filter(|plot| plot.is_planted())
            .map(|plot| plot.health)
            .sum();
        Some(total / planted as f64)
    }

    pub fn average_moisture(&self) -> f64 {
        if self.plots.is_empty() {
            return 0.0;
        }
        self.plots.iter().map(|plot| plot.soil_moisture).sum::<f64>() / self.plots.len() as f64
    }

    pub fn selected(&self) -> Option<&Plot> {
        self.selected_plot.and_then(|index| self.plots.get(index))
    }

    /// Selecting the already-selected plot clears the selection. Unknown ids
    /// leave the session as it was.
    pub fn with_selection(&self, plot: usize) -> Session {
        let mut next = self.clone();
        if plot >= next.plots.len() {
            return next;
        }
        next.selected_plot = if next.selected_plot == Some(plot) {
            None
        } else {
            Some(plot)
        };
        next
    }

    pub fn summarize_week(&self) -> WeekSummary {
        WeekSummary {
            week: self.week,
            date: self.date.clone(),
            money: self.money,
            planted: self.planted_count(),
            average_health: self.sustainability_score(),
            average_moisture: self.average_moisture(),
            event: self
                .latest_sample
                .as_ref()
                .and_then(|sample| sample.special_event.as_ref())
                .map(|event| event.event_name.clone()),
        }
    }
}
