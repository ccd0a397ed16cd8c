use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::session::Session;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionSnapshot<'a> {
    scenario: &'a str,
    week: u32,
    season_profit: i64,
    sustainability_score: Option<f64>,
    session: &'a Session,
}

/// Writes the session to `{dir}/{scenario}/week_NNN.json` every
/// `interval_weeks` weeks. An interval of zero disables snapshots.
pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval_weeks: u32,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>, interval_weeks: u32) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval_weeks,
        }
    }

    pub fn maybe_write(
        &self,
        session: &Session,
        scenario_name: &str,
    ) -> Result<Option<PathBuf>, SnapshotError> {
        if self.interval_weeks == 0 {
            return Ok(None);
        }
        if session.week % self.interval_weeks != 0 && !session.complete {
            return Ok(None);
        }

        let dir = self.output_dir.join(scenario_name);
        fs::create_dir_all(&dir)?;
        let file_path = dir.join(format!("week_{:03}.json", session.week));
        let snapshot = SessionSnapshot {
            scenario: scenario_name,
            week: session.week,
            season_profit: session.season_profit(),
            sustainability_score: session.sustainability_score(),
            session,
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&file_path, json)?;
        Ok(Some(file_path))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;

    #[test]
    fn writes_on_interval_weeks() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path(), 2);
        let mut session = Session::new(SessionConfig::default());
        session.week = 3;
        assert!(writer.maybe_write(&session, "demo").unwrap().is_none());

        session.week = 4;
        let path = writer.maybe_write(&session, "demo").unwrap().unwrap();
        assert!(path.ends_with("demo/week_004.json"));
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["week"], 4);
        assert_eq!(value["seasonProfit"], 0);
        assert_eq!(value["session"]["plots"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn final_week_is_always_written() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path(), 5);
        let mut session = Session::new(SessionConfig::default());
        session.week = 7;
        session.complete = true;
        assert!(writer.maybe_write(&session, "demo").unwrap().is_some());
    }

    #[test]
    fn zero_interval_disables() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path(), 0);
        let session = Session::new(SessionConfig::default());
        assert!(writer.maybe_write(&session, "demo").unwrap().is_none());
    }
}
