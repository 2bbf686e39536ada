//! Registry of live page sessions and their downloads
//!
//! A session is registered when its WebSocket opens and removed when it
//! closes; everything it registered goes with it.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::{ToolError, ToolResult};
use crate::types::{DownloadId, SessionId};

/// Bytes offered to the browser as a named file
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Download {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content,
        }
    }

    /// `Content-Disposition` header value for this file
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename.replace('"', ""))
    }
}

/// Downloads registered by one session
#[derive(Debug, Clone, Default)]
pub struct DownloadStore {
    downloads: Arc<RwLock<HashMap<DownloadId, Download>>>,
}

impl DownloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, download: Download) -> DownloadId {
        let id = DownloadId::new();
        self.downloads.write().await.insert(id, download);
        id
    }

    /// Remove and return a download; each one is served once
    pub async fn take(&self, id: &DownloadId) -> ToolResult<Download> {
        self.downloads
            .write()
            .await
            .remove(id)
            .ok_or_else(|| ToolError::DownloadNotFound { download: id.to_string() })
    }

    pub async fn len(&self) -> usize {
        self.downloads.read().await.len()
    }
}

/// Registry entry for one live session
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub id: SessionId,
    pub page_path: String,
    pub connected_at: DateTime<Utc>,
    pub downloads: DownloadStore,
}

impl SessionEntry {
    pub fn new(id: SessionId, page_path: impl Into<String>, downloads: DownloadStore) -> Self {
        Self {
            id,
            page_path: page_path.into(),
            connected_at: Utc::now(),
            downloads,
        }
    }
}

/// Live sessions keyed by id
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, entry: SessionEntry) {
        let session_id = entry.id;
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, entry);
        crate::tool_info!("📝 Registered session {} ({} active)", session_id, sessions.len());
    }

    /// Remove a session, returning whether it was registered
    pub async fn remove(&self, session_id: &SessionId) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.remove(session_id) {
            Some(entry) => {
                crate::tool_info!(
                    "🗑️ Removed session {} ({} active, {} downloads never fetched)",
                    session_id,
                    sessions.len(),
                    entry.downloads.len().await
                );
                true
            }
            None => {
                crate::tool_warn!("⚠️ Session {} not found in registry", session_id);
                false
            }
        }
    }

    pub async fn get(&self, session_id: &SessionId) -> ToolResult<SessionEntry> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| ToolError::SessionNotFound { session: session_id.to_string() })
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn active_sessions(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().copied().collect()
    }

    /// Hand out a download registered by a live session, at most once
    pub async fn download(&self, session_id: &SessionId, download_id: &DownloadId) -> ToolResult<Download> {
        let entry = self.get(session_id).await?;
        entry.downloads.take(download_id).await
    }
}
