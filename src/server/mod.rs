//! Preview server with live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::services::ServeFile;

use crate::commands::generate::SiteWatcher;
use crate::generator::output_path;
use crate::Site;

const LIVE_RELOAD_PATH: &str = "/__livereload";

/// Reconnects by reloading, so a restarted server picks the page back up
const LIVE_RELOAD_SCRIPT: &str = r#"<script>
(function () {
  var socket = new WebSocket("ws://" + location.host + "/__livereload");
  socket.onmessage = function (event) {
    if (event.data === "reload") location.reload();
  };
  socket.onclose = function () {
    setTimeout(function () { location.reload(); }, 1000);
  };
})();
</script>
"#;

struct ServerState {
    public_dir: PathBuf,
    root: String,
    reloads: broadcast::Sender<()>,
    live_reload: bool,
}

/// Serve the public directory, regenerating and reloading pages on change
/// when `watch` is set
pub async fn start(site: &Site, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let (reloads, _) = broadcast::channel(16);

    if watch {
        let watcher = SiteWatcher::new(site)?;
        let reloads = reloads.clone();
        tokio::task::spawn_blocking(move || {
            let result = watcher.run(|| {
                // No connected pages is fine
                let _ = reloads.send(());
            });
            if let Err(e) = result {
                tracing::error!("File watcher stopped: {:#}", e);
            }
        });
    }

    let state = Arc::new(ServerState {
        public_dir: site.public_dir.clone(),
        root: site.config.root.clone(),
        reloads,
        live_reload: watch,
    });
    let app = Router::new()
        .route(LIVE_RELOAD_PATH, get(live_reload))
        .fallback(serve_page)
        .with_state(state);

    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;
    let url = format!("http://{}:{}{}", ip, port, site.config.root);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Serving {} at {}", site.public_dir.display(), url);
    if watch {
        println!("Watching for changes. Press Ctrl+C to stop.");
    }
    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}

async fn live_reload(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> Response {
    let reloads = state.reloads.subscribe();
    ws.on_upgrade(move |socket| push_reloads(socket, reloads))
}

/// Forward reload notifications to one page until either side goes away
async fn push_reloads(mut socket: WebSocket, mut reloads: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");
    loop {
        let open = tokio::select! {
            reload = reloads.recv() => match reload {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    socket.send(Message::Text("reload".to_string())).await.is_ok()
                }
                Err(RecvError::Closed) => false,
            },
            incoming = socket.recv() => {
                matches!(incoming, Some(Ok(ref msg)) if !matches!(msg, Message::Close(_)))
            }
        };
        if !open {
            break;
        }
    }
    tracing::debug!("Live reload client disconnected");
}

async fn serve_page(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    let Some(file) = resolve_request(&state.public_dir, &state.root, request.uri().path()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let is_html = matches!(
        file.extension().and_then(|e| e.to_str()),
        Some("html") | Some("htm")
    );
    if is_html && state.live_reload {
        return match tokio::fs::read_to_string(&file).await {
            Ok(html) => Html(with_live_reload(&html)).into_response(),
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", file, e);
                (StatusCode::NOT_FOUND, "Not found").into_response()
            }
        };
    }

    match ServeFile::new(&file).try_call(request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::warn!("Failed to serve {:?}: {}", file, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Map a request path to the file the generator wrote for it. The path is
/// percent-decoded and must sit under the site root.
fn resolve_request(public_dir: &Path, root: &str, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let root = root.trim_end_matches('/');
    let rest = decoded.strip_prefix(root)?;
    if !(rest.is_empty() || rest.starts_with('/')) {
        return None;
    }

    let relative = Path::new(rest.trim_start_matches('/'));
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let exact = public_dir.join(relative);
    if exact.is_file() {
        return Some(exact);
    }
    let page = output_path(public_dir, &format!("{}/", rest.trim_end_matches('/')))?;
    page.is_file().then_some(page)
}

fn with_live_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &html[..pos], LIVE_RELOAD_SCRIPT, &html[pos..]),
        None => format!("{}{}", html, LIVE_RELOAD_SCRIPT),
    }
}

fn open_browser(url: &str) -> std::io::Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/c", "start"]);
        command
    } else {
        Command::new("xdg-open")
    };
    command.arg(url).spawn().map(drop)
}
