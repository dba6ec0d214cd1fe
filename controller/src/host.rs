use std::{
    collections::{BTreeMap, HashMap},
    io::ErrorKind,
    net::SocketAddr,
    path::PathBuf,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{Offset, Utc};
use chrono_tz::Tz;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use fishled_common::{
    ClockSample, FixtureConfig, HourOverride, LightEngine, OutputFrame, ScheduleDelta,
    ScheduleTable, SettingsUpdate,
};

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<LightEngine>>,
    timezone: Arc<String>,
    time_synced: Arc<AtomicBool>,
    store: ScheduleStore,
}

#[derive(Clone)]
struct ScheduleStore {
    config_path: Arc<PathBuf>,
    overrides_path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = ScheduleStore::new();
    let mut config = store.load_config().await.unwrap_or_else(|err| {
        warn!("failed to load fixture config from store: {err:#}");
        FixtureConfig::default()
    });
    config.sanitize();

    let mut schedule = ScheduleTable::default();
    match store.load_overrides().await {
        Ok(overrides) => {
            for (hour, entry) in overrides {
                schedule.apply_override(hour, entry);
            }
        }
        Err(err) => warn!("failed to load schedule overrides from store: {err:#}"),
    }

    let timezone = config.timezone.clone();
    let tick_period = Duration::from_millis(config.tick_period_ms);
    let engine = LightEngine::new(config, schedule);

    let app_state = AppState {
        engine: Arc::new(Mutex::new(engine)),
        timezone: Arc::new(timezone),
        time_synced: Arc::new(AtomicBool::new(false)),
        store,
    };

    spawn_control_loop(app_state.clone(), tick_period);

    let web_root = format!("{}/web", env!("CARGO_MANIFEST_DIR"));
    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/schedule", get(handle_get_schedule))
        .route("/api/update", post(handle_update))
        .route("/api/reset", post(handle_reset))
        .route("/api/preview", post(handle_preview))
        .fallback_service(ServeDir::new(web_root))
        .with_state(app_state);

    let port = std::env::var("FISHLED_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse().unwrap();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind fixture server at {addr}"))?;

    info!("fixture controller listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => warn!("failed to listen for shutdown signal: {err}"),
    }
}

fn spawn_control_loop(app_state: AppState, tick_period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_period);
        let mut tick: u64 = 0;

        loop {
            interval.tick().await;
            tick = tick.saturating_add(1);

            let clock = match now_in_timezone(&app_state.timezone) {
                Some(now) => {
                    app_state.time_synced.store(true, Ordering::Relaxed);
                    ClockSample::from_datetime(&now)
                }
                None => {
                    // Unsynchronized clock: keep ticking with UTC.
                    app_state.time_synced.store(false, Ordering::Relaxed);
                    ClockSample::from_datetime(&Utc::now())
                }
            };

            let raw_adc = read_adc(tick);

            let output = {
                let mut engine = app_state.engine.lock().await;
                engine.tick(clock, raw_adc)
            };

            debug!(
                temperature = output.temperature_c,
                hour = output.clock.hour,
                minute = output.clock.minute,
                preview = output.preview_active,
                "tick"
            );
            emit_frame(output.frame);
        }
    });
}

/// Hardware integration point: replace with the NTC divider read on
/// the ESP target. The simulated value idles around room temperature.
fn read_adc(tick: u64) -> u16 {
    512 + ((tick % 8) as u16 * 2)
}

/// Hardware integration point: the four duties go to the PWM
/// peripheral on the ESP target; the host build only logs them.
fn emit_frame(frame: OutputFrame) {
    info!(
        white = frame.white,
        blue = frame.blue,
        purple = frame.purple,
        fan = frame.fan,
        "output frame"
    );
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    Json(engine.status(state.time_synced.load(Ordering::Relaxed), &state.timezone))
}

async fn handle_get_schedule(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    Json(*engine.schedule().entries())
}

async fn handle_update(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let update = parse_update(&params);

    let deltas = {
        let mut engine = state.engine.lock().await;
        engine.apply_update(update)
    };

    // Write-through, best effort: a persistence failure never rolls
    // back the in-memory table.
    if !deltas.is_empty() {
        if let Err(err) = state.store.save_deltas(&deltas).await {
            warn!("failed to persist schedule update: {err:#}");
        }
    }

    handle_get_status(State(state)).await.into_response()
}

async fn handle_reset(State(state): State<AppState>) -> impl IntoResponse {
    {
        let mut engine = state.engine.lock().await;
        engine.reset_schedule();
    }

    if let Err(err) = state.store.clear_overrides().await {
        warn!("failed to clear persisted schedule overrides: {err:#}");
    }

    handle_get_schedule(State(state)).await.into_response()
}

async fn handle_preview(State(state): State<AppState>) -> impl IntoResponse {
    {
        let mut engine = state.engine.lock().await;
        engine.start_preview();
    }
    info!("preview mode started");
    handle_get_status(State(state)).await.into_response()
}

/// Mirror of the device form: absent or unparseable fields are simply
/// not part of the update.
fn parse_update(params: &HashMap<String, String>) -> SettingsUpdate {
    SettingsUpdate {
        hour: field(params, "hour"),
        white: field(params, "white"),
        blue: field(params, "blue"),
        purple: field(params, "purple"),
        fan: field(params, "fan"),
    }
}

fn field<T: FromStr>(params: &HashMap<String, String>, name: &str) -> Option<T> {
    params.get(name).and_then(|value| value.trim().parse().ok())
}

impl ScheduleStore {
    fn new() -> Self {
        let data_dir = std::env::var("FISHLED_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.fishled"));

        Self {
            config_path: Arc::new(data_dir.join("config.json")),
            overrides_path: Arc::new(data_dir.join("schedule.json")),
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn load_config(&self) -> anyhow::Result<FixtureConfig> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(self.config_path.as_ref()).await {
            Ok(raw) => Ok(serde_json::from_slice::<FixtureConfig>(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(FixtureConfig::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn load_overrides(&self) -> anyhow::Result<BTreeMap<u8, HourOverride>> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(self.overrides_path.as_ref()).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save_deltas(&self, deltas: &[ScheduleDelta]) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut overrides = match tokio::fs::read(self.overrides_path.as_ref()).await {
            Ok(raw) => serde_json::from_slice::<BTreeMap<u8, HourOverride>>(&raw)
                .unwrap_or_else(|err| {
                    warn!("discarding unreadable schedule overrides: {err}");
                    BTreeMap::new()
                }),
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        for delta in deltas {
            overrides
                .entry(delta.hour)
                .or_default()
                .set(delta.channel, delta.value);
        }

        self.write_overrides(&overrides).await
    }

    async fn clear_overrides(&self) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        self.write_overrides(&BTreeMap::new()).await
    }

    async fn write_overrides(&self, overrides: &BTreeMap<u8, HourOverride>) -> anyhow::Result<()> {
        let path = self.overrides_path.as_ref().clone();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(overrides)?;
        tokio::fs::write(path, payload).await?;
        Ok(())
    }
}

fn now_in_timezone(timezone: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    let tz: Tz = timezone.parse().ok()?;
    let local = Utc::now().with_timezone(&tz);
    Some(local.with_timezone(&local.offset().fix()))
}
