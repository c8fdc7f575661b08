//! HTTP surface for an external presentation layer: state snapshots,
//! command submission and a server-sent stream of game events.

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    command::{CommandOutcome, Order},
    events::{GameEvent, GameObserver},
    game::Game,
    scenario::Scenario,
    snapshot::{GameSnapshot, SnapshotWriter},
};

/// Forwards every game event to SSE subscribers as JSON.
struct BroadcastObserver {
    tx: broadcast::Sender<String>,
}

impl GameObserver for BroadcastObserver {
    fn on_event(&mut self, event: &GameEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            // No subscribers is fine.
            let _ = self.tx.send(payload);
        }
    }
}

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub snapshot: GameSnapshot,
}

#[derive(Clone)]
struct AppState {
    game: Arc<Mutex<Game>>,
    broadcaster: broadcast::Sender<String>,
    scenario_name: String,
    snapshots: Arc<SnapshotWriter>,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub snapshot_interval: u32,
    pub snapshot_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        snapshot_interval,
        snapshot_dir,
        host,
        port,
    } = config;

    let mut game = scenario
        .build_game()
        .with_context(|| format!("Failed to set up scenario '{}'", scenario.name))?;
    let (tx, _) = broadcast::channel::<String>(512);
    game.register_observer(Box::new(BroadcastObserver { tx: tx.clone() }));

    let state = AppState {
        game: Arc::new(Mutex::new(game)),
        broadcaster: tx,
        scenario_name: scenario.name.clone(),
        snapshots: Arc::new(SnapshotWriter::new(snapshot_dir, snapshot_interval)),
    };

    let router = Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/command", post(submit_command))
        .route("/api/events", get(stream_events))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, scenario = %scenario.name, "web surface listening (Ctrl+C to stop)");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down web surface");
}

async fn latest_state(
    State(state): State<AppState>,
) -> Result<Json<StateEnvelope>, StatusCode> {
    let game = state
        .game
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        snapshot: game.snapshot(),
    }))
}

async fn submit_command(
    State(state): State<AppState>,
    Json(order): Json<Order>,
) -> Result<Json<CommandOutcome>, StatusCode> {
    let mut game = state
        .game
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let outcome = game.apply(order.player, order.command);
    if let CommandOutcome::TurnEnded(report) = &outcome {
        if report.round_completed {
            if let Err(err) = state
                .snapshots
                .maybe_write(&game.snapshot(), &state.scenario_name)
            {
                tracing::error!(%err, "snapshot failed");
            }
        }
    }
    Ok(Json(outcome))
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
