//! HTTP and WebSocket server hosting the registered pages
//!
//! Each page path serves the HTML shell; the shell opens `/ws?page=<path>`
//! and from then on the page is driven by [`UiUpdate`] messages from its
//! server-side session.

use axum::{
    Router,
    extract::{
        Path, Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::errors::{ToolError, ToolResult};
use crate::messages::{NotifyLevel, NotifyPosition, PageEvent};
use crate::page::{Page, PageRouter, PageSession};
use crate::session::{SessionEntry, SessionRegistry};
use crate::types::{DownloadId, SessionId, ToolId};
use crate::ui::UiHandle;
use crate::{tool_error, tool_info, tool_warn};

const PAGE_SHELL: &str = include_str!("../static/page.html");

/// Buffered UI updates per session before senders wait
const UI_CHANNEL_CAPACITY: usize = 256;

struct ServerState {
    pages: PageRouter,
    sessions: SessionRegistry,
    started_at: Instant,
}

/// Server hosting a set of pages
#[derive(Clone)]
pub struct ToolServer {
    state: Arc<ServerState>,
}

impl ToolServer {
    pub fn new(pages: PageRouter) -> Self {
        Self {
            state: Arc::new(ServerState {
                pages,
                sessions: SessionRegistry::new(),
                started_at: Instant::now(),
            }),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.state.sessions
    }

    /// Build the Axum router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = Router::new();

        for (path, page) in self.state.pages.iter() {
            let html = render_shell(page.title(), path);
            router = router.route(path, get(move || async move { Html(html) }));
        }

        router
            .route("/ws", get(websocket_handler))
            .route("/download/:session/:download", get(download_handler))
            .route("/health", get(health_check))
            .route("/api/status", get(status_handler))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()).into_inner())
            .with_state(self.state.clone())
    }

    /// Bind `addr` and serve until Ctrl+C
    pub async fn run(&self, addr: SocketAddr) -> ToolResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ToolError::ServerStartup(format!("Failed to bind to {addr}: {e}")))?;

        tool_info!("🌐 {} tool listening on http://{}", ToolId::current(), addr);

        self.serve(listener, async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tool_info!("🛑 Received Ctrl+C, shutting down"),
                Err(e) => tool_error!("Signal handling failed: {}", e),
            }
        })
        .await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> ToolResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.state.pages.is_empty() {
            return Err(ToolError::ServerStartup("no pages registered".to_string()));
        }
        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Resolve `--host`/`--port` to a bind address; accepts names and IPv6 literals
pub async fn resolve_bind_addr(host: &str, port: u16) -> ToolResult<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| ToolError::ServerStartup(format!("Cannot resolve {host}: {e}")))?
        .next()
        .ok_or_else(|| ToolError::ServerStartup(format!("No address found for {host}")))
}

fn render_shell(title: &str, path: &str) -> String {
    PAGE_SHELL
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{PAGE}}", &escape_html(path))
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[derive(Debug, Deserialize)]
struct WsParams {
    page: Option<String>,
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<ServerState>>,
) -> Response {
    let path = params.page.unwrap_or_else(|| "/".to_string());
    match state.pages.get(&path) {
        Ok(page) => ws.on_upgrade(move |socket| handle_session(socket, state, path, page)),
        Err(e) => e.into_response(),
    }
}

/// Drive one page session until the browser disconnects
async fn handle_session(socket: WebSocket, state: Arc<ServerState>, path: String, page: Arc<dyn Page>) {
    let session_id = SessionId::new();
    let (ui, mut updates) = UiHandle::channel(session_id, UI_CHANNEL_CAPACITY);
    state
        .sessions
        .add(SessionEntry::new(session_id, path.clone(), ui.downloads().clone()))
        .await;
    tool_info!(session = %session_id, "🔗 Page session opened on {}", path);

    let (mut sender, mut receiver) = socket.split();

    let outgoing_task = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            let text = match serde_json::to_string(&update) {
                Ok(text) => text,
                Err(e) => {
                    tool_error!("Failed to serialize UI update: {}", e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(text)).await {
                tool_warn!(session = %session_id, "Failed to send update: {}", e);
                break;
            }
        }
    });

    let session = page.create_session();
    if let Err(e) = session.mount(&ui).await {
        tool_error!(session = %session_id, "Failed to mount page {}: {}", path, e);
    }

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tool_warn!(session = %session_id, "WebSocket error: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => match serde_json::from_str::<PageEvent>(&text) {
                Ok(event) => dispatch_event(event, &session, &ui).await,
                Err(e) => {
                    let error = ToolError::InvalidEvent { details: e.to_string() };
                    tool_warn!(session = %session_id, "{}", error);
                }
            },
            Message::Close(_) => {
                tool_info!(session = %session_id, "Browser requested close");
                break;
            }
            _ => {}
        }
    }

    outgoing_task.abort();
    state.sessions.remove(&session_id).await;
    tool_info!(session = %session_id, "👋 Page session closed");
}

/// Apply a browser event to its session
///
/// Value changes are recorded before the next event is read, so a click
/// always sees the input values typed before it. Clicks run in their own
/// task.
async fn dispatch_event(event: PageEvent, session: &Arc<dyn PageSession>, ui: &UiHandle) {
    match event {
        PageEvent::Change { element, value } => ui.set_value(element, value).await,
        PageEvent::Click { element } => {
            let session = session.clone();
            let ui = ui.clone();
            tokio::spawn(async move {
                if let Err(e) = session.on_click(&element, &ui).await {
                    tool_error!(session = %ui.session_id(), "Click handler for {} failed: {}", element, e);
                    let _ = ui
                        .notify(e.to_string(), NotifyLevel::Negative, NotifyPosition::TopRight)
                        .await;
                }
            });
        }
    }
}

async fn download_handler(
    Path((session_id, download_id)): Path<(SessionId, DownloadId)>,
    State(state): State<Arc<ServerState>>,
) -> Result<Response, ToolError> {
    let download = state.sessions.download(&session_id, &download_id).await?;
    tool_info!(
        session = %session_id,
        "⬇️ Serving {} ({} bytes)",
        download.filename,
        download.content.len()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, download.content_type.clone()),
            (header::CONTENT_DISPOSITION, download.content_disposition()),
        ],
        download.content,
    )
        .into_response())
}

async fn health_check(State(state): State<Arc<ServerState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().timestamp(),
        "uptime": state.started_at.elapsed().as_secs(),
        "sessions": state.sessions.count().await,
    }))
}

async fn status_handler(State(state): State<Arc<ServerState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "running",
        "tool": ToolId::current().to_string(),
        "pages": state.pages.paths(),
        "session_count": state.sessions.count().await,
        "active_sessions": state.sessions.active_sessions().await,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::UiUpdate;
    use crate::page::MockPageSession;
    use crate::session::{Download, DownloadStore};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    struct HelloPage;

    impl Page for HelloPage {
        fn title(&self) -> &str {
            "Hello <tool>"
        }

        fn create_session(&self) -> Arc<dyn PageSession> {
            let mut session = MockPageSession::new();
            session.expect_mount().returning(|_| Ok(()));
            Arc::new(session)
        }
    }

    fn test_server() -> ToolServer {
        ToolServer::new(PageRouter::new().page("/", HelloPage))
    }

    async fn get(server: &ToolServer, uri: &str) -> Response {
        server
            .build_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_page_route_serves_shell() {
        let response = get(&test_server(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<title>Hello &lt;tool&gt;</title>"));
        assert!(html.contains("data-page=\"/\""));
        assert!(!html.contains("{{"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = get(&test_server(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["sessions"], 0);
    }

    #[tokio::test]
    async fn test_status_lists_pages() {
        let response = get(&test_server(), "/api/status").await;
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["pages"], json!(["/"]));
        assert_eq!(value["session_count"], 0);
    }

    #[tokio::test]
    async fn test_status_lists_session_ids() {
        let server = test_server();
        let session_id = SessionId::new();
        server
            .sessions()
            .add(SessionEntry::new(session_id, "/", DownloadStore::new()))
            .await;

        let response = get(&server, "/api/status").await;
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["active_sessions"], json!([session_id.to_string()]));
    }

    #[tokio::test]
    async fn test_download_is_served_once() {
        let server = test_server();
        let session_id = SessionId::new();
        let downloads = DownloadStore::new();
        server
            .sessions()
            .add(SessionEntry::new(session_id, "/", downloads.clone()))
            .await;
        let download_id = downloads
            .insert(Download::new("output.csv", "text/csv; charset=utf-8", b"a,b\r\n".to_vec()))
            .await;
        let uri = format!("/download/{session_id}/{download_id}");

        assert_eq!(get(&server, &uri).await.status(), StatusCode::OK);
        assert_eq!(get(&server, &uri).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(downloads.len().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_bind_addr_accepts_names_and_ipv6() {
        let v4 = resolve_bind_addr("127.0.0.1", 8081).await.unwrap();
        assert_eq!(v4, "127.0.0.1:8081".parse::<SocketAddr>().unwrap());

        let v6 = resolve_bind_addr("::1", 8080).await.unwrap();
        assert_eq!(v6, "[::1]:8080".parse::<SocketAddr>().unwrap());

        let named = resolve_bind_addr("localhost", 8080).await.unwrap();
        assert!(named.ip().is_loopback());
        assert_eq!(named.port(), 8080);
    }

    #[tokio::test]
    async fn test_serve_without_pages_fails() {
        let server = ToolServer::new(PageRouter::new());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let result = server.serve(listener, async {}).await;
        assert!(matches!(result, Err(ToolError::ServerStartup(_))));
    }

    #[tokio::test]
    async fn test_download_served_as_attachment() {
        let server = test_server();
        let session_id = SessionId::new();
        let downloads = DownloadStore::new();
        server
            .sessions()
            .add(SessionEntry::new(session_id, "/", downloads.clone()))
            .await;
        let download_id = downloads
            .insert(Download::new("output.csv", "text/csv; charset=utf-8", b"a,b\r\n".to_vec()))
            .await;

        let response = get(&server, &format!("/download/{session_id}/{download_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"output.csv\""
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"a,b\r\n");
    }

    #[tokio::test]
    async fn test_unknown_download_is_404() {
        let response = get(
            &test_server(),
            &format!("/download/{}/{}", SessionId::new(), DownloadId::new()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_click_error_becomes_negative_notification() {
        let mut session = MockPageSession::new();
        session
            .expect_on_click()
            .returning(|_, _| Err(ToolError::handler("boom")));
        let session: Arc<dyn PageSession> = Arc::new(session);
        let (ui, mut rx) = UiHandle::channel(SessionId::new(), 4);

        dispatch_event(PageEvent::Click { element: "e1".into() }, &session, &ui).await;

        match rx.recv().await.unwrap() {
            UiUpdate::Notify { message, level, .. } => {
                assert_eq!(message, "Handler failed: boom");
                assert_eq!(level, NotifyLevel::Negative);
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_change_is_recorded_before_returning() {
        let session: Arc<dyn PageSession> = Arc::new(MockPageSession::new());
        let (ui, _rx) = UiHandle::channel(SessionId::new(), 4);

        dispatch_event(
            PageEvent::Change { element: "e1".into(), value: "a,b".to_string() },
            &session,
            &ui,
        )
        .await;

        assert_eq!(ui.value(&"e1".into()).await, "a,b");
    }
}
