//! Special-event classification from raw weekly readings.
//!
//! Heat is checked before drought, and the critical level before the
//! warning level, so a week carries at most one event.

use serde::{Deserialize, Serialize};

use crate::environment::SpecialEvent;

pub const HEAT_SEVERE: &str = "Heat_Severe";
pub const HEAT_WARNING: &str = "Heat_Warning";
pub const DROUGHT_SEVERE: &str = "Drought_Severe";
pub const DROUGHT_WARNING: &str = "Drought_Warning";

/// Stress thresholds for one climate zone. Temperatures are daytime land
/// surface temperature in °C, moisture is root-zone percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub heat_critical: f64,
    pub heat_warning: f64,
    pub drought_critical: f64,
    pub drought_warning: f64,
}

impl Thresholds {
    pub const PUNJAB: Thresholds = Thresholds {
        heat_critical: 45.0,
        heat_warning: 40.0,
        drought_critical: 10.0,
        drought_warning: 15.0,
    };
    pub const IOWA: Thresholds = Thresholds {
        heat_critical: 38.0,
        heat_warning: 33.0,
        drought_critical: 20.0,
        drought_warning: 25.0,
    };
    pub const SAHEL: Thresholds = Thresholds {
        heat_critical: 48.0,
        heat_warning: 43.0,
        drought_critical: 5.0,
        drought_warning: 12.0,
    };
    pub const NETHERLANDS: Thresholds = Thresholds {
        heat_critical: 30.0,
        heat_warning: 25.0,
        drought_critical: 30.0,
        drought_warning: 35.0,
    };
    pub const BRAZIL: Thresholds = Thresholds {
        heat_critical: 35.0,
        heat_warning: 30.0,
        drought_critical: 18.0,
        drought_warning: 23.0,
    };

    /// Built-in thresholds by region name; unknown regions fall back to
    /// Punjab.
    pub fn for_region(region: &str) -> Thresholds {
        match region.to_ascii_lowercase().as_str() {
            "iowa" => Self::IOWA,
            "sahel" => Self::SAHEL,
            "netherlands" => Self::NETHERLANDS,
            "brazil" => Self::BRAZIL,
            _ => Self::PUNJAB,
        }
    }

    pub fn classify(&self, temperature_c: f64, soil_root_pct: f64) -> Option<SpecialEvent> {
        if temperature_c > self.heat_critical {
            return Some(event(
                HEAT_SEVERE,
                format!(
                    "CRITICAL HEAT: Temp is {temperature_c:.1}°C. Extreme heat is accelerating water loss!"
                ),
            ));
        }
        if temperature_c > self.heat_warning {
            return Some(event(
                HEAT_WARNING,
                format!("HEAT WARNING: Temp is {temperature_c:.1}°C. Increase irrigation watch."),
            ));
        }
        if soil_root_pct < self.drought_critical {
            return Some(event(
                DROUGHT_SEVERE,
                format!(
                    "SEVERE DROUGHT: Root moisture is {soil_root_pct}%. Crop failure is imminent!"
                ),
            ));
        }
        if soil_root_pct < self.drought_warning {
            return Some(event(
                DROUGHT_WARNING,
                format!(
                    "DROUGHT WARNING: Root moisture is {soil_root_pct}%. Immediate action is advised."
                ),
            ));
        }
        None
    }
}

fn event(name: &str, description: String) -> SpecialEvent {
    SpecialEvent {
        event_name: name.to_string(),
        description,
    }
}
