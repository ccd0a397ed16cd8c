use std::path::PathBuf;

use rand::RngCore;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    actions::{self, ActionRequest, ActionResult},
    environment::{EnvironmentSample, EnvironmentSource, EventFlags, SourceError},
    plot::Plot,
    report::SeasonReport,
    rng::RngManager,
    scenario::{Rules, Scenario},
    session::{Session, SessionConfig},
    snapshot::SnapshotWriter,
    systems::{DryingSystem, FertilizerSystem, GrowthSystem, HealthSystem, PestSystem},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub rules: Rules,
    pub snapshot_interval_weeks: u32,
    pub snapshot_dir: Option<PathBuf>,
}

impl EngineSettings {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
            rules: scenario.rules.clone(),
            snapshot_interval_weeks: scenario.snapshot_interval_weeks,
            snapshot_dir: None,
        }
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// The weekly plot update in its required order.
    pub fn with_default_systems(self) -> Self {
        self.with_system(GrowthSystem::new())
            .with_system(FertilizerSystem::new())
            .with_system(PestSystem::new())
            .with_system(HealthSystem::new())
            .with_system(DryingSystem::new())
    }

    pub fn build(self, config: SessionConfig) -> Engine {
        let snapshot_writer = self
            .settings
            .snapshot_dir
            .as_ref()
            .map(|dir| SnapshotWriter::new(dir, self.settings.snapshot_interval_weeks));
        Engine {
            session: Session::new(config),
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer,
            settings: self.settings,
            in_flight: None,
        }
    }
}

/// Owns the current session and is the only place that replaces it.
pub struct Engine {
    session: Session,
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: Option<SnapshotWriter>,
    settings: EngineSettings,
    in_flight: Option<InFlight>,
}

/// Which fetch the engine is waiting on. Both block actions and other
/// fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Briefing,
    Turn,
}

/// The sample a pending briefing or turn is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRequest {
    pub week: u32,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum SeasonEnd {
    DataExhausted,
    SourceFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TurnOutcome {
    Advanced {
        week: u32,
        complete: bool,
        #[serde(rename = "snapshotPath")]
        snapshot_path: Option<PathBuf>,
    },
    SeasonEnded {
        reason: SeasonEnd,
    },
    Rejected,
}

impl Engine {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn report(&self) -> SeasonReport {
        SeasonReport::from_session(&self.session)
    }

    /// Loads the opening week's conditions. Every plot starts at the
    /// region's measured soil moisture. Returns false when no briefing was
    /// applied; the session then stays active without conditions.
    pub fn start(&mut self, source: &dyn EnvironmentSource) -> bool {
        let Some(request) = self.begin_briefing() else {
            return false;
        };
        let fetched = source.sample(request.week, &request.region);
        self.brief(&request, fetched)
    }

    /// Marks the opening-week fetch as in flight. `None` once a briefing has
    /// been applied, while another fetch is pending, or after the season.
    pub fn begin_briefing(&mut self) -> Option<TurnRequest> {
        if self.in_flight.is_some()
            || self.session.complete
            || self.session.latest_sample.is_some()
        {
            return None;
        }
        self.in_flight = Some(InFlight::Briefing);
        Some(TurnRequest {
            week: self.session.week,
            region: self.session.config.region.clone(),
        })
    }

    /// Applies the fetch started with [`Engine::begin_briefing`] and clears
    /// the processing flag.
    pub fn brief(
        &mut self,
        request: &TurnRequest,
        fetched: Result<Option<EnvironmentSample>, SourceError>,
    ) -> bool {
        if self.in_flight != Some(InFlight::Briefing) {
            return false;
        }
        self.in_flight = None;
        if request.week != self.session.week || request.region != self.session.config.region {
            debug!(week = request.week, region = %request.region, "stale briefing dropped");
            return false;
        }

        let sample = match fetched {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                warn!(region = %request.region, week = request.week, "no briefing data for opening week");
                return false;
            }
            Err(err) => {
                warn!(region = %request.region, error = %err, "failed to load briefing data");
                return false;
            }
        };

        let conditions = sample.conditions();
        let mut next = self.session.clone();
        for plot in &mut next.plots {
            plot.set_soil_moisture(conditions.soil_moisture);
        }
        next.week = sample.turn_number;
        next.date = Some(sample.date.clone());
        next.conditions = Some(conditions);
        next.latest_sample = Some(sample);
        info!(region = %request.region, week = next.week, date = ?next.date, "season briefing loaded");
        self.session = next;
        true
    }

    pub fn select_plot(&mut self, plot: usize) -> bool {
        if self.session.complete || plot >= self.session.plots.len() {
            return false;
        }
        self.session = self.session.with_selection(plot);
        true
    }

    pub fn perform_action(&mut self, request: &ActionRequest) -> Option<ActionResult> {
        if let Some(pending) = self.in_flight {
            debug!(action = request.kind.label(), ?pending, "action rejected while a fetch is pending");
            return None;
        }
        match actions::apply(&self.session, request, &self.settings.rules) {
            Some((next, result)) => {
                info!(
                    action = request.kind.label(),
                    level = request.level.label(),
                    plot = ?next.selected_plot,
                    money = next.money,
                    "action applied"
                );
                self.session = next;
                Some(result)
            }
            None => {
                debug!(
                    action = request.kind.label(),
                    level = request.level.label(),
                    "action rejected"
                );
                None
            }
        }
    }

    /// Marks a turn as in flight and says which sample to fetch. `None` when
    /// a fetch is already pending or the season is over.
    pub fn begin_turn(&mut self) -> Option<TurnRequest> {
        if self.in_flight.is_some() || self.session.complete {
            return None;
        }
        self.in_flight = Some(InFlight::Turn);
        Some(TurnRequest {
            week: self.session.week + 1,
            region: self.session.config.region.clone(),
        })
    }

    /// Applies the fetch result of a turn started with [`Engine::begin_turn`]
    /// and clears the processing flag. A failed fetch ends the season the
    /// same way missing data does; the outcome keeps the reason. A snapshot
    /// that cannot be written is logged and leaves `snapshot_path` empty.
    pub fn finish_turn(
        &mut self,
        request: &TurnRequest,
        fetched: Result<Option<EnvironmentSample>, SourceError>,
    ) -> TurnOutcome {
        if self.in_flight != Some(InFlight::Turn) {
            return TurnOutcome::Rejected;
        }
        self.in_flight = None;

        let sample = match fetched {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                info!(week = request.week, region = %request.region, "no more data, season over");
                self.end_season();
                return TurnOutcome::SeasonEnded {
                    reason: SeasonEnd::DataExhausted,
                };
            }
            Err(err) => {
                warn!(
                    week = request.week,
                    region = %request.region,
                    error = %err,
                    "environment fetch failed, ending season"
                );
                self.end_season();
                return TurnOutcome::SeasonEnded {
                    reason: SeasonEnd::SourceFailed(err.to_string()),
                };
            }
        };

        if sample.turn_number != request.week {
            warn!(
                requested = request.week,
                received = sample.turn_number,
                "sample week differs from requested week"
            );
        }

        self.session = self.apply_sample(sample);
        let week = self.session.week;
        let complete = self.session.complete;
        info!(
            week,
            complete,
            money = self.session.money,
            health = ?self.session.sustainability_score(),
            "week advanced"
        );

        let snapshot_path = self.write_snapshot();
        TurnOutcome::Advanced {
            week,
            complete,
            snapshot_path,
        }
    }

    pub fn advance_week(&mut self, source: &dyn EnvironmentSource) -> TurnOutcome {
        let Some(request) = self.begin_turn() else {
            return TurnOutcome::Rejected;
        };
        let fetched = source.sample(request.week, &request.region);
        self.finish_turn(&request, fetched)
    }

    /// Starts the same season over with a fresh grid and a reseeded RNG.
    /// A fetch still pending from before the reset is dropped when it lands.
    pub fn reset(&mut self) {
        self.session = Session::new(self.session.config.clone());
        self.rng = RngManager::new(self.settings.seed);
        self.in_flight = None;
        info!(region = %self.session.config.region, "session reset");
    }

    fn write_snapshot(&self) -> Option<PathBuf> {
        let writer = self.snapshot_writer.as_ref()?;
        match writer.maybe_write(&self.session, &self.settings.scenario_name) {
            Ok(path) => path,
            Err(err) => {
                warn!(week = self.session.week, error = %err, "failed to write snapshot");
                None
            }
        }
    }

    fn end_season(&mut self) {
        let mut next = self.session.clone();
        next.complete = true;
        self.session = next;
    }

    /// Runs every system over a copy of the plots so the current session is
    /// never seen half-updated.
    fn apply_sample(&mut self, sample: EnvironmentSample) -> Session {
        let flags = sample.flags();
        let mut plots = self.session.plots.clone();
        let ctx = TurnContext::new(flags, &self.settings.rules);
        for system in &mut self.systems {
            let mut stream = self.rng.stream(system.name());
            system.run(&ctx, &mut plots, &mut stream);
        }
        debug_assert!(plots.iter().all(Plot::is_within_bounds));

        let mut next = self.session.clone();
        next.plots = plots;
        next.week = sample.turn_number;
        next.complete = next.week >= next.config.total_weeks;
        next.date = Some(sample.date.clone());
        next.conditions = Some(sample.conditions());
        next.latest_sample = Some(sample);
        let summary = next.summarize_week();
        next.history.push(summary);
        next
    }
}

pub struct TurnContext<'a> {
    pub flags: EventFlags,
    pub rules: &'a Rules,
}

impl<'a> TurnContext<'a> {
    pub fn new(flags: EventFlags, rules: &'a Rules) -> Self {
        Self { flags, rules }
    }
}

/// One step of the weekly plot update.
pub trait System: Send {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &TurnContext<'_>, plots: &mut [Plot], rng: &mut dyn RngCore);
}
