//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

/// One result row; values are rendered and exported in order
pub type Row = Vec<String>;

/// Global tool identity for logging
static TOOL_ID: OnceLock<ToolId> = OnceLock::new();

/// Tool identity used to stamp log events and pick the log filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolId {
    /// Single-action tool
    Basic,
    /// Batch tool with table output
    Tabular,
    /// No binary claimed an identity (tests, embedding)
    Library,
}

impl ToolId {
    /// Initialize the global tool ID for the basic tool
    pub fn init_basic() -> ToolId {
        *TOOL_ID.get_or_init(|| ToolId::Basic)
    }

    /// Initialize the global tool ID for the tabular tool
    pub fn init_tabular() -> ToolId {
        *TOOL_ID.get_or_init(|| ToolId::Tabular)
    }

    /// Get the global tool ID, `Library` until a binary initializes it
    pub fn current() -> ToolId {
        TOOL_ID.get().copied().unwrap_or(ToolId::Library)
    }

    /// Crate name used as the tracing target of this tool's events
    pub fn log_target(&self) -> &'static str {
        match self {
            ToolId::Basic => "basic_tool",
            ToolId::Tabular => "tabular_tool",
            ToolId::Library => "shared",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolId::Basic => write!(f, "basic"),
            ToolId::Tabular => write!(f, "tabular"),
            ToolId::Library => write!(f, "library"),
        }
    }
}

/// Unique identifier for a page session (one browser connection)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a registered download
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(Uuid);

impl DownloadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DownloadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a UI element within one page session
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Element ids are `e{n}` with `n` counting up per session
    pub fn from_index(index: u64) -> Self {
        Self(format!("e{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
