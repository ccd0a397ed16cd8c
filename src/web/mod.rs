//! HTTP service: raw weekly samples plus a single interactive session.

mod error;

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

pub use error::WebError;

use crate::{
    actions::{ActionKind, ActionLevel, ActionResult},
    engine::{Engine, EngineBuilder, EngineSettings, TurnOutcome},
    environment::{EnvironmentSample, EnvironmentSource, SourceError},
    report::SeasonReport,
    scenario::Scenario,
    session::{Phase, Session},
};

pub struct AppState {
    scenario: Scenario,
    source: Arc<dyn EnvironmentSource>,
    snapshot_dir: Option<PathBuf>,
    engine: Mutex<Option<Engine>>,
    broadcaster: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(
        scenario: Scenario,
        source: Arc<dyn EnvironmentSource>,
        snapshot_dir: Option<PathBuf>,
    ) -> Self {
        let (broadcaster, _) = broadcast::channel(256);
        Self {
            scenario,
            source,
            snapshot_dir,
            engine: Mutex::new(None),
            broadcaster,
        }
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, Option<Engine>>, WebError> {
        self.engine
            .lock()
            .map_err(|_| WebError::Internal("engine lock poisoned".to_string()))
    }

    fn build_engine(&self, region: Option<String>) -> Engine {
        let scenario = match region {
            Some(region) => self.scenario.clone().with_region(region),
            None => self.scenario.clone(),
        };
        let mut settings = EngineSettings::from_scenario(&scenario);
        if let Some(dir) = &self.snapshot_dir {
            settings = settings.with_snapshot_dir(dir);
        }
        EngineBuilder::new(settings)
            .with_default_systems()
            .build(scenario.session_config())
    }

    fn publish<T: Serialize>(&self, kind: &str, payload: &T) {
        let message = serde_json::json!({ "type": kind, "payload": payload });
        // Nobody listening is fine.
        let _ = self.broadcaster.send(message.to_string());
    }

    /// Runs a source lookup off the async runtime. A panicked lookup is
    /// reported as a source failure.
    async fn fetch(
        &self,
        week: u32,
        region: String,
    ) -> Result<Option<EnvironmentSample>, SourceError> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || source.sample(week, &region))
            .await
            .unwrap_or_else(|err| Err(SourceError::Unavailable(format!("fetch task failed: {err}"))))
    }
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub source: Arc<dyn EnvironmentSource>,
    pub snapshot_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/gamestate", get(gamestate))
        .route("/api/session", get(session_view).post(start_session))
        .route("/api/session/select", post(select_plot))
        .route("/api/session/actions", post(perform_action))
        .route("/api/session/advance", post(advance_week))
        .route("/api/session/reset", post(reset_session))
        .route("/api/session/report", get(season_report))
        .route("/api/session/events", get(stream_events))
        .with_state(state)
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        source,
        snapshot_dir,
        host,
        port,
    } = config;

    let scenario_name = scenario.name.clone();
    let state = Arc::new(AppState::new(scenario, source, snapshot_dir));
    let router = build_router(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, scenario = %scenario_name, "croppilot API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

#[derive(Debug, Deserialize)]
struct GamestateQuery {
    turn: Option<String>,
    region: Option<String>,
}

async fn gamestate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GamestateQuery>,
) -> Result<Json<EnvironmentSample>, WebError> {
    let turn = match query.turn.as_deref() {
        None => 1,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| WebError::BadRequest("Invalid turn number".to_string()))?,
    };
    let region = query
        .region
        .unwrap_or_else(|| state.scenario.region.clone());

    match state.fetch(turn, region.clone()).await {
        Ok(Some(sample)) => Ok(Json(sample)),
        Ok(None) => Err(WebError::NotFound(format!(
            "Turn {turn} not found for region {region}"
        ))),
        Err(SourceError::Unavailable(msg)) => Err(WebError::NotFound(msg)),
        Err(err) => {
            warn!(turn, region = %region, error = %err, "gamestate lookup failed");
            Err(WebError::Source(err.to_string()))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: Phase,
    pub processing: bool,
    pub season_profit: i64,
    pub sustainability_score: Option<f64>,
    pub session: Session,
}

impl SessionView {
    fn of(engine: &Engine) -> Self {
        let session = engine.session();
        Self {
            phase: session.phase(),
            processing: engine.is_processing(),
            season_profit: session.season_profit(),
            sustainability_score: session.sustainability_score(),
            session: session.clone(),
        }
    }
}

fn no_session() -> WebError {
    WebError::NotFound("no session has been started".to_string())
}

async fn session_view(State(state): State<Arc<AppState>>) -> Result<Json<SessionView>, WebError> {
    let guard = state.lock_engine()?;
    let engine = guard.as_ref().ok_or_else(no_session)?;
    Ok(Json(SessionView::of(engine)))
}

#[derive(Debug, Default, Deserialize)]
struct StartRequest {
    region: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    briefed: bool,
    #[serde(flatten)]
    view: SessionView,
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartRequest>>,
) -> Result<Json<StartResponse>, WebError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let mut engine = state.build_engine(request.region);
    let briefed = match engine.begin_briefing() {
        Some(briefing) => {
            let fetched = state.fetch(briefing.week, briefing.region.clone()).await;
            engine.brief(&briefing, fetched)
        }
        None => false,
    };
    let view = SessionView::of(&engine);

    *state.lock_engine()? = Some(engine);
    info!(region = %view.session.config.region, briefed, "session started");
    state.publish("session", &view);
    Ok(Json(StartResponse { briefed, view }))
}

#[derive(Debug, Deserialize)]
struct SelectRequest {
    plot: usize,
}

async fn select_plot(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SessionView>, WebError> {
    let mut guard = state.lock_engine()?;
    let engine = guard.as_mut().ok_or_else(no_session)?;
    engine.select_plot(request.plot);
    Ok(Json(SessionView::of(engine)))
}

#[derive(Debug, Deserialize)]
struct ActionBody {
    action: ActionKind,
    level: Option<ActionLevel>,
    cost: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionResponse {
    accepted: bool,
    result: Option<ActionResult>,
    session: SessionView,
}

async fn perform_action(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActionBody>,
) -> Result<Json<ActionResponse>, WebError> {
    let request = state.scenario.prices.quote(body.action, body.level, body.cost);
    let response = {
        let mut guard = state.lock_engine()?;
        let engine = guard.as_mut().ok_or_else(no_session)?;
        let result = engine.perform_action(&request);
        ActionResponse {
            accepted: result.is_some(),
            result,
            session: SessionView::of(engine),
        }
    };
    if let Some(result) = &response.result {
        state.publish("action", result);
    }
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdvanceResponse {
    outcome: TurnOutcome,
    session: SessionView,
}

async fn advance_week(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdvanceResponse>, WebError> {
    let request = {
        let mut guard = state.lock_engine()?;
        let engine = guard.as_mut().ok_or_else(no_session)?;
        match engine.begin_turn() {
            Some(request) => request,
            None => {
                return Ok(Json(AdvanceResponse {
                    outcome: TurnOutcome::Rejected,
                    session: SessionView::of(engine),
                }))
            }
        }
    };

    let fetched = state.fetch(request.week, request.region.clone()).await;

    let response = {
        let mut guard = state.lock_engine()?;
        let engine = guard.as_mut().ok_or_else(no_session)?;
        let outcome = engine.finish_turn(&request, fetched);
        AdvanceResponse {
            outcome,
            session: SessionView::of(engine),
        }
    };
    state.publish("turn", &response.outcome);
    Ok(Json(response))
}

async fn reset_session(State(state): State<Arc<AppState>>) -> Result<Json<SessionView>, WebError> {
    let briefing = {
        let mut guard = state.lock_engine()?;
        let engine = guard.as_mut().ok_or_else(no_session)?;
        engine.reset();
        engine.begin_briefing()
    };

    let fetched = match &briefing {
        Some(briefing) => Some(state.fetch(briefing.week, briefing.region.clone()).await),
        None => None,
    };

    let view = {
        let mut guard = state.lock_engine()?;
        let engine = guard.as_mut().ok_or_else(no_session)?;
        if let (Some(briefing), Some(fetched)) = (&briefing, fetched) {
            engine.brief(briefing, fetched);
        }
        SessionView::of(engine)
    };
    state.publish("session", &view);
    Ok(Json(view))
}

async fn season_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeasonReport>, WebError> {
    let guard = state.lock_engine()?;
    let engine = guard.as_ref().ok_or_else(no_session)?;
    Ok(Json(engine.report()))
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
