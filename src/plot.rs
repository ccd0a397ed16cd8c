use serde::{Deserialize, Serialize};

pub const HEALTH_MAX: f64 = 100.0;
pub const PEST_MAX: f64 = 100.0;
pub const MOISTURE_MAX: f64 = 1.0;
pub const SEEDLING_STAGE: u8 = 1;
pub const MATURE_STAGE: u8 = 5;
pub const DEFAULT_SOIL_MOISTURE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crop {
    Corn,
}

impl Crop {
    pub fn label(self) -> &'static str {
        match self {
            Crop::Corn => "corn",
        }
    }
}

/// One cell of the farm grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plot {
    pub id: usize,
    #[serde(rename = "cropType")]
    pub crop: Option<Crop>,
    pub growth_stage: u8,
    pub health: f64,
    pub soil_moisture: f64,
    pub fertilizer_effect: u32,
    pub pest_level: f64,
}

impl Plot {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            crop: None,
            growth_stage: 0,
            health: HEALTH_MAX,
            soil_moisture: DEFAULT_SOIL_MOISTURE,
            fertilizer_effect: 0,
            pest_level: 0.0,
        }
    }

    pub fn is_planted(&self) -> bool {
        self.crop.is_some()
    }

    pub fn is_harvestable(&self) -> bool {
        self.is_planted() && self.growth_stage == MATURE_STAGE
    }

    pub fn set_health(&mut self, value: f64) {
        self.health = value.clamp(0.0, HEALTH_MAX);
    }

    pub fn set_soil_moisture(&mut self, value: f64) {
        self.soil_moisture = value.clamp(0.0, MOISTURE_MAX);
    }

    pub fn set_pest_level(&mut self, value: f64) {
        self.pest_level = value.clamp(0.0, PEST_MAX);
    }

    pub fn plant(&mut self, crop: Crop) {
        self.crop = Some(crop);
        self.growth_stage = SEEDLING_STAGE;
        self.health = HEALTH_MAX;
    }

    /// Value of the crop if harvested now, scaled by health.
    pub fn harvest_value(&self, max_value: u32) -> u32 {
        ((self.health / HEALTH_MAX) * f64::from(max_value)).floor() as u32
    }

    /// Clears the crop and restores full health. Soil, pests and any leftover
    /// fertilizer stay with the plot.
    pub fn clear_crop(&mut self) {
        self.crop = None;
        self.growth_stage = 0;
        self.health = HEALTH_MAX;
    }

    pub fn is_within_bounds(&self) -> bool {
        (0.0..=HEALTH_MAX).contains(&self.health)
            && (0.0..=MOISTURE_MAX).contains(&self.soil_moisture)
            && (0.0..=PEST_MAX).contains(&self.pest_level)
            && self.growth_stage <= MATURE_STAGE
    }
}

pub fn fresh_grid(size: usize) -> Vec<Plot> {
    (0..size).map(Plot::new).collect()
}
