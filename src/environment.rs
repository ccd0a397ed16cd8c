//! Environmental samples and the source the turn engine pulls them from.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: Option<f64>,
    pub unit: Option<String>,
}

impl Reading {
    pub fn new(value: f64, unit: &str) -> Self {
        Self {
            value: Some(value),
            unit: Some(unit.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonData {
    /// Root-zone soil moisture, percent.
    pub soil_moisture: Reading,
    /// Vegetation index (NDVI), 0-1.
    pub crop_health: Reading,
    pub temperature: Reading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialEvent {
    pub event_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSample {
    pub turn_number: u32,
    pub date: String,
    pub region: String,
    pub season_data: SeasonData,
    pub special_event: Option<SpecialEvent>,
}

impl EnvironmentSample {
    pub fn flags(&self) -> EventFlags {
        EventFlags::from_event(self.special_event.as_ref())
    }

    /// Field conditions on the 0-1 scales the plots use.
    pub fn conditions(&self) -> FieldConditions {
        FieldConditions {
            soil_moisture: self.season_data.soil_moisture.value.unwrap_or(0.0) / 100.0,
            vegetation_index: self.season_data.crop_health.value.unwrap_or(0.0),
            temperature: self.season_data.temperature.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConditions {
    pub soil_moisture: f64,
    pub vegetation_index: f64,
    pub temperature: Reading,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFlags {
    pub heatwave: bool,
    pub drought: bool,
    pub severe: bool,
}

impl EventFlags {
    /// Flags come from case-sensitive substrings of the event name.
    pub fn from_event(event: Option<&SpecialEvent>) -> Self {
        match event {
            Some(event) => Self {
                heatwave: event.event_name.contains("Heat"),
                drought: event.event_name.contains("Drought"),
                severe: event.event_name.contains("Severe"),
            },
            None => Self::default(),
        }
    }

    pub fn is_calm(&self) -> bool {
        !(self.heatwave || self.drought || self.severe)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("environment data io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("environment data parse error: {0}")]
    Parse(String),
    #[error("environment data unavailable: {0}")]
    Unavailable(String),
}

/// Where weekly samples come from. `Ok(None)` means the season has no data
/// for that week; errors are transport or decoding failures.
pub trait EnvironmentSource: Send + Sync {
    fn sample(&self, week: u32, region: &str) -> Result<Option<EnvironmentSample>, SourceError>;
}
