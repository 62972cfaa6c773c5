// src/serve/server.rs

use std::{fs, path::Path, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    response::sse::{Event, Sse},
    routing::get,
};
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tower_http::services::{ServeDir, ServeFile};
use tracing::debug;

/// Live reload message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadMessage {
    /// Full page reload.
    Reload,
    /// Granular update: only the listed assets changed (paths relative to
    /// the served root). Browsers hot-swap stylesheets and fall back to a
    /// full reload for anything else.
    Assets(Vec<String>),
}

/// Server state containing the reload broadcaster.
#[derive(Clone)]
pub struct ServerState {
    /// Broadcast channel for live reload events.
    pub reload_tx: broadcast::Sender<ReloadMessage>,
}

impl ServerState {
    /// Create a new server state.
    pub fn new() -> Self {
        let (reload_tx, _) = broadcast::channel(16);
        Self { reload_tx }
    }

    /// Send a full-reload notification to all connected clients.
    pub fn notify_reload(&self) {
        let _ = self.reload_tx.send(ReloadMessage::Reload);
    }

    /// Push a granular asset update to all connected clients.
    pub fn notify_assets(&self, assets: Vec<String>) {
        if assets.is_empty() {
            return;
        }
        let _ = self.reload_tx.send(ReloadMessage::Assets(assets));
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the development server router.
pub fn create_router(output_dir: &Path, index: &str, state: Arc<ServerState>) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(output_dir.join(index)))
        .route("/__livereload", get(livereload_handler))
        .fallback_service(ServeDir::new(output_dir))
        .with_state(state)
}

/// Server-Sent Events handler for live reload.
async fn livereload_handler(
    axum::extract::State(state): axum::extract::State<Arc<ServerState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let rx = state.reload_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        match msg {
            Ok(msg) => Some(Ok(Event::default().data(encode_message(&msg)))),
            Err(_) => None, // Ignore lagged messages
        }
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Wire encoding of a reload message as SSE data.
pub fn encode_message(msg: &ReloadMessage) -> String {
    match msg {
        ReloadMessage::Reload => "reload".to_string(),
        ReloadMessage::Assets(assets) => format!("assets:{}", assets.join(",")),
    }
}

/// JavaScript snippet injected into served HTML pages.
pub const LIVERELOAD_SCRIPT: &str = r#"
<script>
(function() {
    const source = new EventSource('/__livereload');
    source.onmessage = function(event) {
        if (event.data === 'reload') {
            window.location.reload();
            return;
        }
        if (event.data.indexOf('assets:') !== 0) {
            return;
        }
        const assets = event.data.slice(7).split(',');
        if (!assets.every(function(a) { return a.endsWith('.css'); })) {
            window.location.reload();
            return;
        }
        // Hot-swap only the changed stylesheets.
        document.querySelectorAll('link[rel="stylesheet"]').forEach(function(link) {
            const href = link.href.split('?')[0];
            if (assets.some(function(a) { return href.endsWith(a); })) {
                link.href = href + '?v=' + Date.now();
            }
        });
    };
    source.onerror = function() {
        console.log('[livereload] Connection lost, retrying...');
    };
})();
</script>
"#;

/// Inject the livereload script into one HTML file, if not already present.
pub fn inject_livereload(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)?;

    if content.contains("__livereload") {
        return Ok(());
    }

    let modified = if content.contains("</body>") {
        content.replace("</body>", &format!("{LIVERELOAD_SCRIPT}</body>"))
    } else {
        format!("{content}{LIVERELOAD_SCRIPT}")
    };
    fs::write(path, modified)?;
    debug!(?path, "injected livereload script");
    Ok(())
}

/// Inject the livereload script into every HTML file under `output_dir`.
pub fn inject_livereload_into_dir(output_dir: &Path) -> Result<()> {
    if !output_dir.is_dir() {
        return Ok(());
    }

    for entry in walkdir::WalkDir::new(output_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
    {
        inject_livereload(entry.path())?;
    }

    Ok(())
}
