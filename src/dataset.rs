//! File-backed environmental data: processed satellite readings per region,
//! one record per game week.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::environment::{
    EnvironmentSample, EnvironmentSource, Reading, SeasonData, SourceError, SpecialEvent,
};
use crate::events::Thresholds;

#[derive(Debug, Clone, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    thresholds: HashMap<String, Thresholds>,
    regions: BTreeMap<String, Vec<WeekRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeekRecord {
    pub turn: u32,
    pub start_date: NaiveDate,
    pub ndvi: f64,
    pub soil_root_pct: f64,
    pub lst_day_c: f64,
    /// Overrides threshold classification when present.
    #[serde(default)]
    pub event: Option<SpecialEvent>,
}

#[derive(Debug, Clone)]
struct RegionSeries {
    name: String,
    thresholds: Thresholds,
    records: BTreeMap<u32, WeekRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    regions: HashMap<String, RegionSeries>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, SourceError> {
        let file: DatasetFile =
            serde_yaml::from_str(text).map_err(|err| SourceError::Parse(err.to_string()))?;
        let overrides: HashMap<String, Thresholds> = file
            .thresholds
            .into_iter()
            .map(|(name, limits)| (name.to_ascii_lowercase(), limits))
            .collect();

        let mut regions = HashMap::with_capacity(file.regions.len());
        for (name, records) in file.regions {
            let key = name.to_ascii_lowercase();
            let thresholds = overrides
                .get(&key)
                .copied()
                .unwrap_or_else(|| Thresholds::for_region(&name));
            let mut by_turn = BTreeMap::new();
            for record in records {
                if by_turn.insert(record.turn, record).is_some() {
                    return Err(SourceError::Parse(format!(
                        "region '{name}' lists a turn more than once"
                    )));
                }
            }
            regions.insert(
                key,
                RegionSeries {
                    name,
                    thresholds,
                    records: by_turn,
                },
            );
        }
        Ok(Self { regions })
    }

    pub fn regions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.regions.values().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn weeks_available(&self, region: &str) -> usize {
        self.regions
            .get(&region.to_ascii_lowercase())
            .map_or(0, |series| series.records.len())
    }
}

impl EnvironmentSource for Dataset {
    fn sample(&self, week: u32, region: &str) -> Result<Option<EnvironmentSample>, SourceError> {
        let series = self
            .regions
            .get(&region.to_ascii_lowercase())
            .ok_or_else(|| SourceError::Unavailable(format!("no data for region '{region}'")))?;
        let Some(record) = series.records.get(&week) else {
            debug!(week, region, "no record for week");
            return Ok(None);
        };

        let special_event = record.event.clone().or_else(|| {
            series
                .thresholds
                .classify(record.lst_day_c, record.soil_root_pct)
        });

        Ok(Some(EnvironmentSample {
            turn_number: record.turn,
            date: record.start_date.format("%Y-%m-%d").to_string(),
            region: series.name.clone(),
            season_data: SeasonData {
                soil_moisture: Reading::new(round_to(record.soil_root_pct, 2), "%"),
                crop_health: Reading::new(round_to(record.ndvi, 2), "NDVI"),
                temperature: Reading::new(round_to(record.lst_day_c, 1), "C"),
            },
            special_event,
        }))
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
