//! Per-session handle for building the page from server-side code

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};

use crate::errors::{ToolError, ToolResult};
use crate::messages::{NotifyLevel, NotifyPosition, UiUpdate};
use crate::session::{Download, DownloadStore};
use crate::types::{DownloadId, ElementId, Row, SessionId};

/// Cloneable handle to one page session's browser view
///
/// Element-creating calls return the new element's id. Every call fails with
/// [`ToolError::SessionClosed`] once the browser has gone away.
#[derive(Debug, Clone)]
pub struct UiHandle {
    session_id: SessionId,
    sender: mpsc::Sender<UiUpdate>,
    next_element: Arc<AtomicU64>,
    values: Arc<RwLock<HashMap<ElementId, String>>>,
    downloads: DownloadStore,
}

impl UiHandle {
    /// Create a handle and the receiving end of its update stream
    pub fn channel(session_id: SessionId, capacity: usize) -> (Self, mpsc::Receiver<UiUpdate>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let handle = Self {
            session_id,
            sender,
            next_element: Arc::new(AtomicU64::new(0)),
            values: Arc::new(RwLock::new(HashMap::new())),
            downloads: DownloadStore::new(),
        };
        (handle, receiver)
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn downloads(&self) -> &DownloadStore {
        &self.downloads
    }

    fn next_id(&self) -> ElementId {
        ElementId::from_index(self.next_element.fetch_add(1, Ordering::Relaxed))
    }

    async fn send(&self, update: UiUpdate) -> ToolResult<()> {
        self.sender.send(update).await.map_err(|_| ToolError::SessionClosed {
            session: self.session_id.to_string(),
        })
    }

    pub async fn label(&self, text: impl Into<String>) -> ToolResult<ElementId> {
        let element = self.next_id();
        self.send(UiUpdate::Label { element: element.clone(), text: text.into() }).await?;
        Ok(element)
    }

    pub async fn textarea(&self, label: impl Into<String>) -> ToolResult<ElementId> {
        let element = self.next_id();
        self.send(UiUpdate::TextArea { element: element.clone(), label: label.into() }).await?;
        Ok(element)
    }

    pub async fn button(&self, text: impl Into<String>) -> ToolResult<ElementId> {
        let element = self.next_id();
        self.send(UiUpdate::Button { element: element.clone(), text: text.into() }).await?;
        Ok(element)
    }

    pub async fn separator(&self) -> ToolResult<ElementId> {
        let element = self.next_id();
        self.send(UiUpdate::Separator { element: element.clone() }).await?;
        Ok(element)
    }

    pub async fn spinner(&self, text: impl Into<String>) -> ToolResult<ElementId> {
        let element = self.next_id();
        self.send(UiUpdate::Spinner { element: element.clone(), text: text.into() }).await?;
        Ok(element)
    }

    pub async fn table(&self, columns: &[String]) -> ToolResult<ElementId> {
        let element = self.next_id();
        self.send(UiUpdate::Table { element: element.clone(), columns: columns.to_vec() })
            .await?;
        Ok(element)
    }

    pub async fn add_rows(&self, table: &ElementId, rows: Vec<Row>) -> ToolResult<()> {
        self.send(UiUpdate::AddRows { element: table.clone(), rows }).await
    }

    pub async fn delete(&self, element: &ElementId) -> ToolResult<()> {
        self.values.write().await.remove(element);
        self.send(UiUpdate::Delete { element: element.clone() }).await
    }

    pub async fn notify(
        &self,
        message: impl Into<String>,
        level: NotifyLevel,
        position: NotifyPosition,
    ) -> ToolResult<()> {
        self.send(UiUpdate::Notify { message: message.into(), level, position }).await
    }

    /// Register bytes for download and tell the browser to fetch them
    pub async fn download(&self, download: Download) -> ToolResult<DownloadId> {
        let filename = download.filename.clone();
        let download_id = self.downloads.insert(download).await;
        let url = format!("/download/{}/{}", self.session_id, download_id);
        self.send(UiUpdate::Download { url, filename }).await?;
        Ok(download_id)
    }

    /// Latest value the browser reported for an input, empty if none yet
    pub async fn value(&self, element: &ElementId) -> String {
        self.values.read().await.get(element).cloned().unwrap_or_default()
    }

    pub async fn set_value(&self, element: ElementId, value: String) {
        self.values.write().await.insert(element, value);
    }
}
