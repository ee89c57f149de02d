use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use notify::{Event, RecursiveMode, Watcher};
use serde::Deserialize;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tower_http::services::ServeDir;
use tower_livereload::LiveReloadLayer;

use memory_galaxy::io::read_items;
use memory_galaxy::{GalaxyConfig, GalaxyScene, Item, RngSource, SceneSnapshot};

/// Frame cadence of the headless render loop
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    scene: Arc<Mutex<GalaxyScene>>,
    selection: Arc<std::sync::Mutex<Option<Item>>>,
    started: Instant,
}

impl AppState {
    pub fn new(config: GalaxyConfig, rng: RngSource<rand::rngs::SmallRng>) -> Self {
        let selection = Arc::new(std::sync::Mutex::new(None));
        let sink = Arc::clone(&selection);
        let scene = GalaxyScene::mount(config, rng, move |item: &Item| {
            tracing::info!(id = item.id(), "selected");
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(item.clone());
            }
        });
        Self {
            scene: Arc::new(Mutex::new(scene)),
            selection,
            started: Instant::now(),
        }
    }

    /// Scene time: time since the server mounted the scene
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[derive(Debug, Deserialize)]
pub struct NodeRequest {
    pub id: String,
}

pub async fn get_scene(State(state): State<AppState>) -> Json<SceneSnapshot> {
    Json(state.scene.lock().await.snapshot())
}

pub async fn get_selection(State(state): State<AppState>) -> Json<Option<Item>> {
    let selected = state.selection.lock().map(|s| s.clone()).unwrap_or(None);
    Json(selected)
}

pub async fn pointer_enter(
    State(state): State<AppState>,
    Json(req): Json<NodeRequest>,
) -> StatusCode {
    found(state.scene.lock().await.pointer_enter(&req.id))
}

pub async fn pointer_leave(
    State(state): State<AppState>,
    Json(req): Json<NodeRequest>,
) -> StatusCode {
    found(state.scene.lock().await.pointer_leave(&req.id))
}

pub async fn select(
    State(state): State<AppState>,
    Json(req): Json<NodeRequest>,
) -> Result<Json<Item>, StatusCode> {
    if !state.scene.lock().await.click(&req.id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let selected = state.selection.lock().map(|s| s.clone()).unwrap_or(None);
    selected.map(Json).ok_or(StatusCode::NOT_FOUND)
}

fn found(hit: bool) -> StatusCode {
    if hit {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Build the API router
pub fn router(state: AppState, assets: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/api/scene", get(get_scene))
        .route("/api/selection", get(get_selection))
        .route("/api/nodes/enter", post(pointer_enter))
        .route("/api/nodes/leave", post(pointer_leave))
        .route("/api/nodes/select", post(select));
    if let Some(dir) = assets {
        app = app.fallback_service(ServeDir::new(dir));
    }
    app.with_state(state)
}

/// Reload the dataset from disk into the scene
async fn reload(state: &AppState, input: &Path) -> anyhow::Result<usize> {
    let items = read_items(input)?;
    let count = items.len();
    state.scene.lock().await.load(items);
    Ok(count)
}

/// Start the development server with a live scene
pub async fn serve(
    input: &Path,
    config: GalaxyConfig,
    rng: RngSource<rand::rngs::SmallRng>,
    port: u16,
    assets: Option<&Path>,
) -> anyhow::Result<()> {
    let attention_interval = config.attention.interval();
    let state = AppState::new(config, rng);
    let count = reload(&state, input).await?;
    println!("Loaded {count} items from {}", input.display());

    // Render loop
    let frame_state = state.clone();
    let frame_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        loop {
            ticker.tick().await;
            let now = frame_state.elapsed();
            frame_state.scene.lock().await.frame(now);
        }
    });

    // Dreaming scheduler
    let attention_state = state.clone();
    let attention_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(attention_interval);
        loop {
            ticker.tick().await;
            let now = attention_state.elapsed();
            let mut scene = attention_state.scene.lock().await;
            scene.attention_tick(now);
            for event in scene.drain_events() {
                tracing::debug!(?event, "scene event");
            }
        }
    });

    // Create channel for file change notifications
    let (tx, mut rx) = mpsc::channel::<()>(1);

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if event.kind.is_modify() || event.kind.is_create() {
                let _ = tx.blocking_send(());
            }
        }
    })?;

    // Watch the input file's parent directory
    let watch_path = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    let reload_state = state.clone();
    let reload_input = input.to_path_buf();
    let reload_task = tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Debounce: wait a bit for rapid changes to settle
            tokio::time::sleep(Duration::from_millis(100)).await;
            while rx.try_recv().is_ok() {}

            match reload(&reload_state, &reload_input).await {
                Ok(count) => {
                    println!("Reloaded {count} items");
                    reloader.reload();
                }
                Err(e) => eprintln!("Error reloading items: {e}"),
            }
        }
    });

    let app = router(state.clone(), assets).layer(livereload);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("Galaxy server running at http://localhost:{port}");
    println!("Watching {} for changes...", input.display());
    println!("Press Ctrl+C to stop");

    // Keep watcher alive
    let _watcher = watcher;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    frame_task.abort();
    attention_task.abort();
    reload_task.abort();
    state.scene.lock().await.teardown();
    println!("Galaxy server stopped");

    Ok(())
}
