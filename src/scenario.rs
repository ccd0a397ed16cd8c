use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::actions::{ActionKind, ActionLevel, ActionRequest};
use crate::session::{
    SessionConfig, DEFAULT_GRID_SIZE, DEFAULT_INITIAL_MONEY, DEFAULT_REGION, DEFAULT_TOTAL_WEEKS,
};

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_total_weeks() -> u32 {
    DEFAULT_TOTAL_WEEKS
}

fn default_initial_money() -> i64 {
    DEFAULT_INITIAL_MONEY
}

fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}

fn default_snapshot_interval_weeks() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_total_weeks")]
    pub total_weeks: u32,
    #[serde(default = "default_initial_money")]
    pub initial_money: i64,
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    #[serde(default = "default_snapshot_interval_weeks")]
    pub snapshot_interval_weeks: u32,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default)]
    pub prices: PriceList,
}

/// Tunable constants of the turn and action rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub pest_growth_cap: f64,
    pub heatwave_pest_growth_cap: f64,
    pub optimal_moisture: f64,
    pub moisture_tolerance: f64,
    pub moisture_stress_factor: f64,
    pub optimal_moisture_bonus: f64,
    pub fertilizer_bonus: f64,
    pub pest_damage_threshold: f64,
    pub pest_damage_factor: f64,
    pub severe_event_penalty: f64,
    pub event_penalty: f64,
    pub drying_rate: f64,
    pub heatwave_drying_rate: f64,
    pub harvest_max_value: u32,
    pub water_light: f64,
    pub water_moderate: f64,
    pub water_heavy: f64,
    pub fertilizer_cheap_health: f64,
    pub fertilizer_cheap_weeks: u32,
    pub fertilizer_premium_health: f64,
    pub fertilizer_premium_weeks: u32,
    pub pest_control_basic: f64,
    pub pest_control_advanced: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            pest_growth_cap: 10.0,
            heatwave_pest_growth_cap: 20.0,
            optimal_moisture: 0.5,
            moisture_tolerance: 0.2,
            moisture_stress_factor: 30.0,
            optimal_moisture_bonus: 10.0,
            fertilizer_bonus: 15.0,
            pest_damage_threshold: 40.0,
            pest_damage_factor: 40.0,
            severe_event_penalty: 25.0,
            event_penalty: 15.0,
            drying_rate: 0.1,
            heatwave_drying_rate: 0.2,
            harvest_max_value: 800,
            water_light: 0.15,
            water_moderate: 0.30,
            water_heavy: 0.50,
            fertilizer_cheap_health: 10.0,
            fertilizer_cheap_weeks: 2,
            fertilizer_premium_health: 25.0,
            fertilizer_premium_weeks: 4,
            pest_control_basic: 40.0,
            pest_control_advanced: 80.0,
        }
    }
}

/// Catalogue cost of every action level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceList {
    pub plant: u32,
    pub water_light: u32,
    pub water_moderate: u32,
    pub water_heavy: u32,
    pub fertilize_cheap: u32,
    pub fertilize_premium: u32,
    pub pest_control_basic: u32,
    pub pest_control_advanced: u32,
    pub harvest: u32,
}

impl Default for PriceList {
    fn default() -> Self {
        Self {
            plant: 100,
            water_light: 25,
            water_moderate: 50,
            water_heavy: 75,
            fertilize_cheap: 75,
            fertilize_premium: 150,
            pest_control_basic: 50,
            pest_control_advanced: 100,
            harvest: 0,
        }
    }
}

impl PriceList {
    /// `None` when the level does not belong to the action.
    pub fn price(&self, kind: ActionKind, level: ActionLevel) -> Option<u32> {
        use ActionKind as K;
        use ActionLevel as L;
        match (kind, level) {
            (K::Plant, L::Standard) => Some(self.plant),
            (K::Water, L::Light) => Some(self.water_light),
            (K::Water, L::Moderate) => Some(self.water_moderate),
            (K::Water, L::Heavy) => Some(self.water_heavy),
            (K::Fertilize, L::Cheap) => Some(self.fertilize_cheap),
            (K::Fertilize, L::Premium) => Some(self.fertilize_premium),
            (K::PestControl, L::Basic) => Some(self.pest_control_basic),
            (K::PestControl, L::Advanced) => Some(self.pest_control_advanced),
            (K::Harvest, L::Standard) => Some(self.harvest),
            _ => None,
        }
    }

    /// Builds a request, filling in the action's default level and the
    /// catalogue price when they are not given. A level that does not belong
    /// to the action is kept and costs nothing; the action will reject it.
    pub fn quote(
        &self,
        kind: ActionKind,
        level: Option<ActionLevel>,
        cost: Option<u32>,
    ) -> ActionRequest {
        let level = level.unwrap_or_else(|| kind.default_level());
        let cost = cost.or_else(|| self.price(kind, level)).unwrap_or(0);
        ActionRequest::new(kind, level, cost)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario validation error: {0}")]
    Validation(String),
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text).context("Failed to parse scenario")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::Validation(
                "scenario must define a name".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(ScenarioError::Validation(
                "scenario must name a region".to_string(),
            ));
        }
        if self.total_weeks < 2 {
            return Err(ScenarioError::Validation(format!(
                "total_weeks must be at least 2, got {}",
                self.total_weeks
            )));
        }
        if self.grid_size == 0 {
            return Err(ScenarioError::Validation(
                "grid_size must be greater than zero".to_string(),
            ));
        }
        if self.initial_money < 0 {
            return Err(ScenarioError::Validation(
                "initial_money cannot be negative".to_string(),
            ));
        }
        let rules = &self.rules;
        let non_negative = [
            ("pest_growth_cap", rules.pest_growth_cap),
            ("heatwave_pest_growth_cap", rules.heatwave_pest_growth_cap),
            ("moisture_tolerance", rules.moisture_tolerance),
            ("drying_rate", rules.drying_rate),
            ("heatwave_drying_rate", rules.heatwave_drying_rate),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ScenarioError::Validation(format!(
                    "rules.{field} must be a non-negative number, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&rules.optimal_moisture) {
            return Err(ScenarioError::Validation(format!(
                "rules.optimal_moisture must be within 0..=1, got {}",
                rules.optimal_moisture
            )));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            region: self.region.clone(),
            total_weeks: self.total_weeks,
            initial_money: self.initial_money,
            grid_size: self.grid_size,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}
