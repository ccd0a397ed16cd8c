use croppilot::{
    actions::{ActionKind, ActionLevel, ActionRequest},
    engine::{Engine, EngineBuilder, EngineSettings, SeasonEnd, TurnOutcome},
    environment::{
        EnvironmentSample, EnvironmentSource, Reading, SeasonData, SourceError, SpecialEvent,
    },
    plot::Plot,
    scenario::Rules,
    session::SessionConfig,
};

/// Serves the same readings for weeks `1..=last_week`, then reports no data.
/// Fails instead from `fail_from` onwards when set.
struct FixedSource {
    soil_pct: f64,
    temperature: f64,
    event: Option<&'static str>,
    last_week: u32,
    fail_from: Option<u32>,
}

impl FixedSource {
    fn calm(soil_pct: f64) -> Self {
        Self {
            soil_pct,
            temperature: 24.0,
            event: None,
            last_week: 12,
            fail_from: None,
        }
    }
}

impl EnvironmentSource for FixedSource {
    fn sample(&self, week: u32, region: &str) -> Result<Option<EnvironmentSample>, SourceError> {
        if self.fail_from.is_some_and(|from| week >= from) {
            return Err(SourceError::Unavailable("connection refused".to_string()));
        }
        if week > self.last_week {
            return Ok(None);
        }
        Ok(Some(EnvironmentSample {
            turn_number: week,
            date: format!("2023-06-{:02}", week + 1),
            region: region.to_string(),
            season_data: SeasonData {
                soil_moisture: Reading::new(self.soil_pct, "%"),
                crop_health: Reading::new(0.4, "NDVI"),
                temperature: Reading::new(self.temperature, "C"),
            },
            special_event: self.event.map(|name| SpecialEvent {
                event_name: name.to_string(),
                description: format!("{name} in effect"),
            }),
        }))
    }
}

fn settings(seed: u64) -> EngineSettings {
    EngineSettings {
        scenario_name: "turn_engine".into(),
        seed,
        rules: Rules::default(),
        snapshot_interval_weeks: 0,
        snapshot_dir: None,
    }
}

fn build_engine(seed: u64, config: SessionConfig) -> Engine {
    EngineBuilder::new(settings(seed))
        .with_default_systems()
        .build(config)
}

fn started(seed: u64, source: &FixedSource) -> Engine {
    let mut engine = build_engine(seed, SessionConfig::default());
    assert!(engine.start(source));
    engine
}

fn act(engine: &mut Engine, plot: usize, kind: ActionKind, level: ActionLevel, cost: u32) {
    if engine.session().selected_plot != Some(plot) {
        assert!(engine.select_plot(plot));
    }
    assert!(
        engine
            .perform_action(&ActionRequest::new(kind, level, cost))
            .is_some(),
        "{kind:?} on plot {plot} was rejected"
    );
}

fn plant(engine: &mut Engine, plot: usize) {
    act(engine, plot, ActionKind::Plant, ActionLevel::Standard, 100);
}

#[test]
fn briefing_sets_plot_moisture_from_sample() {
    let source = FixedSource::calm(42.0);
    let engine = started(1, &source);
    let session = engine.session();
    assert_eq!(session.week, 1);
    assert_eq!(session.date.as_deref(), Some("2023-06-02"));
    assert!(session
        .plots
        .iter()
        .all(|plot| (plot.soil_moisture - 0.42).abs() < 1e-9));
    assert!(session.conditions.is_some());
}

#[test]
fn failed_briefing_keeps_session_active() {
    let source = FixedSource {
        fail_from: Some(1),
        ..FixedSource::calm(40.0)
    };
    let mut engine = build_engine(1, SessionConfig::default());
    assert!(!engine.start(&source));
    assert!(!engine.session().complete);
    assert!(engine.session().conditions.is_none());
    assert!(engine.session().plots.iter().all(|plot| plot.soil_moisture == 0.5));
}

#[test]
fn growth_advances_one_stage_per_week_and_stops_at_maturity() {
    let source = FixedSource::calm(50.0);
    let mut engine = started(7, &source);
    plant(&mut engine, 0);

    for expected in 2..=5 {
        engine.advance_week(&source);
        assert_eq!(engine.session().plots[0].growth_stage, expected);
    }
    for _ in 0..3 {
        engine.advance_week(&source);
        let plot = &engine.session().plots[0];
        assert_eq!(plot.growth_stage, 5);
        assert!(plot.is_planted());
    }
    assert_eq!(engine.session().plots[1].growth_stage, 0);
}

#[test]
fn waterlogged_soil_costs_twelve_health() {
    let source = FixedSource::calm(90.0);
    let mut engine = started(3, &source);
    plant(&mut engine, 4);
    assert!((engine.session().plots[4].soil_moisture - 0.9).abs() < 1e-9);

    engine.advance_week(&source);
    let plot = &engine.session().plots[4];
    assert!((plot.health - 88.0).abs() < 1e-9, "health was {}", plot.health);
    assert!((plot.soil_moisture - 0.8).abs() < 1e-9);
}

#[test]
fn unplanted_plots_pass_through_turns() {
    let source = FixedSource {
        event: Some("Heat_Severe"),
        ..FixedSource::calm(30.0)
    };
    let mut engine = started(5, &source);
    let before = engine.session().plots.clone();
    engine.advance_week(&source);
    assert_eq!(engine.session().plots, before);
}

#[test]
fn season_completes_on_final_week() {
    let source = FixedSource::calm(50.0);
    let mut engine = started(11, &source);

    for step in 1..=11 {
        let outcome = engine.advance_week(&source);
        let expected_week = 1 + step;
        assert!(matches!(
            outcome,
            TurnOutcome::Advanced { week, complete, .. }
                if week == expected_week && complete == (expected_week == 12)
        ));
    }
    assert!(engine.session().complete);
    assert_eq!(engine.session().week, 12);
    assert_eq!(engine.session().history.len(), 11);
    assert_eq!(engine.advance_week(&source), TurnOutcome::Rejected);
}

#[test]
fn missing_sample_ends_season_early() {
    let source = FixedSource {
        last_week: 4,
        ..FixedSource::calm(50.0)
    };
    let mut engine = started(11, &source);
    for _ in 0..3 {
        engine.advance_week(&source);
    }
    assert_eq!(engine.session().week, 4);
    assert!(!engine.session().complete);

    let outcome = engine.advance_week(&source);
    assert_eq!(
        outcome,
        TurnOutcome::SeasonEnded {
            reason: SeasonEnd::DataExhausted
        }
    );
    assert!(engine.session().complete);
    assert_eq!(engine.session().week, 4);
    assert!(!engine.is_processing());
}

#[test]
fn source_failure_ends_season_with_reason() {
    let source = FixedSource {
        fail_from: Some(3),
        ..FixedSource::calm(50.0)
    };
    let mut engine = started(11, &source);
    engine.advance_week(&source);
    let outcome = engine.advance_week(&source);
    match outcome {
        TurnOutcome::SeasonEnded {
            reason: SeasonEnd::SourceFailed(message),
        } => assert!(message.contains("connection refused")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(engine.session().complete);
    assert_eq!(engine.session().week, 2);
}

#[test]
fn processing_flag_rejects_actions_and_second_turns() {
    let source = FixedSource::calm(50.0);
    let mut engine = started(2, &source);
    engine.select_plot(0);

    let request = engine.begin_turn().unwrap();
    assert_eq!(request.week, 2);
    assert!(engine.is_processing());
    assert!(engine.begin_turn().is_none());
    assert!(engine
        .perform_action(&ActionRequest::new(
            ActionKind::Plant,
            ActionLevel::Standard,
            100
        ))
        .is_none());
    assert_eq!(engine.session().money, 5_000);

    let fetched = source.sample(request.week, &request.region);
    let outcome = engine.finish_turn(&request, fetched);
    assert!(matches!(outcome, TurnOutcome::Advanced { week: 2, .. }));
    assert!(!engine.is_processing());

    let stale = engine.finish_turn(&request, source.sample(request.week, &request.region));
    assert_eq!(stale, TurnOutcome::Rejected);
    assert_eq!(engine.session().week, 2);
}

#[test]
fn plots_stay_in_bounds_through_a_harsh_season() {
    let source = FixedSource {
        event: Some("Heat_Severe"),
        ..FixedSource::calm(5.0)
    };
    let mut engine = started(99, &source);
    for plot in 0..9 {
        plant(&mut engine, plot);
    }
    act(&mut engine, 0, ActionKind::Water, ActionLevel::Heavy, 75);
    act(&mut engine, 0, ActionKind::Fertilize, ActionLevel::Premium, 150);

    while !engine.session().complete {
        engine.advance_week(&source);
        assert!(engine.session().plots.iter().all(Plot::is_within_bounds));
    }
    assert!(engine
        .session()
        .plots
        .iter()
        .all(|plot| plot.health == 0.0 && plot.soil_moisture == 0.0));
}

#[test]
fn same_seed_plays_the_same_season() {
    let source = FixedSource::calm(55.0);
    let play = |seed: u64| {
        let mut engine = started(seed, &source);
        plant(&mut engine, 0);
        plant(&mut engine, 8);
        for _ in 0..6 {
            engine.advance_week(&source);
        }
        engine.session().clone()
    };

    assert_eq!(play(42), play(42));
    assert_ne!(play(42).plots[0].pest_level, play(43).plots[0].pest_level);
}

#[test]
fn insufficient_funds_leave_session_untouched() {
    let source = FixedSource::calm(50.0);
    let config = SessionConfig {
        initial_money: 60,
        ..SessionConfig::default()
    };
    let mut engine = build_engine(1, config);
    engine.start(&source);
    engine.select_plot(2);
    let before = engine.session().clone();

    let rejected = engine.perform_action(&ActionRequest::new(
        ActionKind::Plant,
        ActionLevel::Standard,
        100,
    ));
    assert!(rejected.is_none());
    assert_eq!(engine.session(), &before);
}

#[test]
fn harvest_pays_out_and_clears_the_plot() {
    let source = FixedSource::calm(50.0);
    let mut engine = started(8, &source);
    plant(&mut engine, 0);
    for _ in 0..4 {
        engine.advance_week(&source);
    }
    let health = engine.session().plots[0].health;
    let money = engine.session().money;

    act(&mut engine, 0, ActionKind::Harvest, ActionLevel::Standard, 0);
    let session = engine.session();
    let value = ((health / 100.0) * 800.0).floor() as i64;
    assert_eq!(session.money, money + value);
    assert_eq!(session.total_harvested, 1);
    assert!(!session.plots[0].is_planted());
    assert_eq!(session.plots[0].growth_stage, 0);
    assert_eq!(session.plots[0].health, 100.0);
}

#[test]
fn reset_restarts_the_season() {
    let source = FixedSource::calm(50.0);
    let mut engine = started(4, &source);
    plant(&mut engine, 0);
    engine.advance_week(&source);

    engine.reset();
    let session = engine.session();
    assert_eq!(session.week, 1);
    assert_eq!(session.money, 5_000);
    assert_eq!(session.planted_count(), 0);
    assert!(session.history.is_empty());
    assert!(engine.start(&source));
}

#[test]
fn unwritable_snapshot_dir_still_advances() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let settings = EngineSettings {
        snapshot_interval_weeks: 1,
        snapshot_dir: Some(blocker.path().to_path_buf()),
        ..settings(6)
    };
    let mut engine = EngineBuilder::new(settings)
        .with_default_systems()
        .build(SessionConfig::default());
    let source = FixedSource::calm(50.0);
    assert!(engine.start(&source));

    let outcome = engine.advance_week(&source);
    assert_eq!(
        outcome,
        TurnOutcome::Advanced {
            week: 2,
            complete: false,
            snapshot_path: None,
        }
    );
    assert_eq!(engine.session().week, 2);
    assert_eq!(engine.session().history.len(), 1);
    assert!(!engine.is_processing());
}

#[test]
fn pending_briefing_blocks_actions() {
    let source = FixedSource::calm(30.0);
    let mut engine = started(4, &source);
    engine.reset();

    let briefing = engine.begin_briefing().unwrap();
    assert_eq!(briefing.week, 1);
    assert!(engine.is_processing());
    assert!(engine.select_plot(0));
    assert!(engine
        .perform_action(&ActionRequest::new(
            ActionKind::Plant,
            ActionLevel::Standard,
            100
        ))
        .is_none());
    assert_eq!(engine.session().money, 5_000);

    let fetched = source.sample(briefing.week, &briefing.region);
    assert!(engine.brief(&briefing, fetched));
    assert!(!engine.is_processing());

    plant(&mut engine, 0);
    act(&mut engine, 0, ActionKind::Water, ActionLevel::Heavy, 75);
    let plot = &engine.session().plots[0];
    assert!((plot.soil_moisture - 0.8).abs() < 1e-9);
    assert_eq!(engine.session().money, 4_825);
}

#[test]
fn pending_briefing_blocks_turns() {
    let source = FixedSource::calm(30.0);
    let mut engine = build_engine(4, SessionConfig::default());

    let briefing = engine.begin_briefing().unwrap();
    assert!(engine.begin_turn().is_none());
    assert!(engine.begin_briefing().is_none());

    let fetched = source.sample(briefing.week, &briefing.region);
    assert!(engine.brief(&briefing, fetched));
    let session = engine.session();
    assert_eq!(session.week, 1);
    assert!(session
        .plots
        .iter()
        .all(|plot| (plot.soil_moisture - 0.3).abs() < 1e-9));

    let turn = engine.begin_turn().unwrap();
    assert!(engine.begin_briefing().is_none());
    assert!(!engine.brief(&briefing, source.sample(1, &briefing.region)));
    let outcome = engine.finish_turn(&turn, source.sample(turn.week, &turn.region));
    assert!(matches!(outcome, TurnOutcome::Advanced { week: 2, .. }));
}

#[test]
fn briefing_dropped_after_reset_mid_fetch() {
    let source = FixedSource::calm(30.0);
    let mut engine = build_engine(4, SessionConfig::default());
    let briefing = engine.begin_briefing().unwrap();
    engine.reset();
    assert!(!engine.is_processing());
    assert!(!engine.brief(&briefing, source.sample(1, &briefing.region)));
    assert!(engine.session().conditions.is_none());
    assert!(engine.start(&source));
}
