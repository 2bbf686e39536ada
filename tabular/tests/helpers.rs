//! Test helper utilities for tabular tool integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

use shared::{PageRouter, Row, ToolResult, ToolServer, UiUpdate};
use tabular_tool::{BatchId, BatchObserver, BatchReport, TabularPage, TokenFailure, Worker};

/// Everything a batch told its observer, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Start(usize),
    Row(usize, Row),
    Failure(TokenFailure),
    Complete(BatchReport),
}

/// Observer that records every callback
#[derive(Clone, Default)]
pub struct CollectingObserver {
    events: Arc<Mutex<Vec<Observed>>>,
}

impl CollectingObserver {
    pub async fn events(&self) -> Vec<Observed> {
        self.events.lock().await.clone()
    }

    pub async fn failures(&self) -> Vec<TokenFailure> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|event| match event {
                Observed::Failure(failure) => Some(failure.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BatchObserver for CollectingObserver {
    async fn on_start(&self, _batch_id: BatchId, token_count: usize) {
        self.events.lock().await.push(Observed::Start(token_count));
    }

    async fn on_row(&self, index: usize, row: &Row) {
        self.events.lock().await.push(Observed::Row(index, row.clone()));
    }

    async fn on_failure(&self, failure: &TokenFailure) {
        self.events.lock().await.push(Observed::Failure(failure.clone()));
    }

    async fn on_complete(&self, report: &BatchReport) {
        self.events.lock().await.push(Observed::Complete(report.clone()));
    }
}

/// A tabular tool served on an ephemeral port
pub struct RunningTool {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<ToolResult<()>>,
}

impl RunningTool {
    pub async fn start(worker: Arc<dyn Worker>, columns: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = ToolServer::new(PageRouter::new().page("/", TabularPage::new(worker, columns)));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Self {
            addr,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, page: &str) -> String {
        format!("ws://{}/ws?page={}", self.addr, page)
    }

    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let result = timeout(Duration::from_secs(5), self.handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))), "server did not stop cleanly");
    }
}

pub type PageSocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Next UI update from the page socket, skipping control frames
pub async fn next_update(socket: &mut PageSocket) -> UiUpdate {
    loop {
        let message = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for UI update")
            .expect("socket closed")
            .expect("socket error");

        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("invalid UI update");
        }
    }
}

/// Collect updates until one matches `done`, inclusive
pub async fn updates_until<F>(socket: &mut PageSocket, done: F) -> Vec<UiUpdate>
where
    F: Fn(&UiUpdate) -> bool,
{
    let mut updates = Vec::new();
    loop {
        let update = next_update(socket).await;
        let finished = done(&update);
        updates.push(update);
        if finished {
            return updates;
        }
    }
}
