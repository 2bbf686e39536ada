//! Tabular tool page
//!
//! Initial page: greeting, text input, "Click me!" button, separator. Each
//! click starts a batch with its own spinner, table and "Download CSV"
//! button, so overlapping batches never share a table.

use async_trait::async_trait;
use shared::{ElementId, NotifyLevel, NotifyPosition, Page, PageSession, Row, ToolResult, UiHandle};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;

use crate::dispatcher::{BatchDispatcher, BatchId, BatchObserver, BatchReport, TokenFailure};
use crate::export;
use crate::table::{ResultTable, SharedTable};
use crate::tokens::{TOKEN_DELIMITER, split_tokens};
use crate::worker::{Worker, core_function, table_columns};

pub const PAGE_TITLE: &str = "Tabular tool";
pub const GREETING: &str = "Hello, world!";
pub const INPUT_LABEL: &str = "Enter some text, separated by commas";
pub const RUN_BUTTON: &str = "Click me!";
pub const PROGRESS_TEXT: &str = "Getting data...";
pub const EXPORT_BUTTON: &str = "Download CSV";

/// Page running the worker over comma-separated input
pub struct TabularPage {
    worker: Arc<dyn Worker>,
    columns: Vec<String>,
}

impl TabularPage {
    pub fn new(worker: Arc<dyn Worker>, columns: Vec<String>) -> Self {
        Self { worker, columns }
    }

    /// Page wired to the template's core function and columns
    pub fn with_core_function() -> Self {
        Self::new(Arc::new(core_function), table_columns())
    }
}

impl Page for TabularPage {
    fn title(&self) -> &str {
        PAGE_TITLE
    }

    fn create_session(&self) -> Arc<dyn PageSession> {
        Arc::new(TabularSession::new(
            BatchDispatcher::new(self.worker.clone()),
            self.columns.clone(),
        ))
    }
}

#[derive(Debug, Clone)]
struct Controls {
    input: ElementId,
    run: ElementId,
}

/// State of one visitor's tabular page
pub struct TabularSession {
    dispatcher: BatchDispatcher,
    columns: Vec<String>,
    controls: OnceLock<Controls>,
    /// Export button -> the table it downloads
    exports: RwLock<HashMap<ElementId, SharedTable>>,
}

impl TabularSession {
    pub fn new(dispatcher: BatchDispatcher, columns: Vec<String>) -> Self {
        Self {
            dispatcher,
            columns,
            controls: OnceLock::new(),
            exports: RwLock::new(HashMap::new()),
        }
    }

    /// Number of finished batches offering an export
    pub async fn export_count(&self) -> usize {
        self.exports.read().await.len()
    }

    async fn run_batch(&self, input: &ElementId, ui: &UiHandle) -> ToolResult<BatchReport> {
        let spinner = ui.spinner(PROGRESS_TEXT).await?;

        let table = ResultTable::new(self.columns.clone()).shared();
        let table_element = ui.table(&self.columns).await?;

        let tokens = split_tokens(&ui.value(input).await, TOKEN_DELIMITER);
        let observer = UiBatchObserver {
            ui: ui.clone(),
            table: table_element,
        };
        let report = self.dispatcher.run(tokens, &table, &observer).await;

        ui.delete(&spinner).await?;

        let export_button = ui.button(EXPORT_BUTTON).await?;
        self.exports.write().await.insert(export_button, table);
        Ok(report)
    }

    async fn export(&self, table: SharedTable, ui: &UiHandle) -> ToolResult<()> {
        let download = {
            let table = table.read().await;
            export::export_download(&table)?
        };
        ui.download(download).await?;
        Ok(())
    }
}

#[async_trait]
impl PageSession for TabularSession {
    async fn mount(&self, ui: &UiHandle) -> ToolResult<()> {
        ui.label(GREETING).await?;
        let input = ui.textarea(INPUT_LABEL).await?;
        let run = ui.button(RUN_BUTTON).await?;
        ui.separator().await?;

        if self.controls.set(Controls { input, run }).is_err() {
            shared::tool_warn!("Session {} mounted twice; keeping first controls", ui.session_id());
        }
        Ok(())
    }

    async fn on_click(&self, element: &ElementId, ui: &UiHandle) -> ToolResult<()> {
        if let Some(controls) = self.controls.get() {
            if *element == controls.run {
                self.run_batch(&controls.input, ui).await?;
                return Ok(());
            }
        }

        let table = self.exports.read().await.get(element).cloned();
        match table {
            Some(table) => self.export(table, ui).await,
            None => {
                tracing::debug!("Ignoring click on {} in session {}", element, ui.session_id());
                Ok(())
            }
        }
    }
}

/// Streams batch progress to the page
struct UiBatchObserver {
    ui: UiHandle,
    table: ElementId,
}

#[async_trait]
impl BatchObserver for UiBatchObserver {
    async fn on_start(&self, batch_id: BatchId, token_count: usize) {
        tracing::debug!("Batch {} rendering into {} ({} tokens)", batch_id, self.table, token_count);
    }

    async fn on_row(&self, _index: usize, row: &Row) {
        if let Err(e) = self.ui.add_rows(&self.table, vec![row.clone()]).await {
            shared::tool_warn!("Could not show row in {}: {}", self.table, e);
        }
    }

    async fn on_failure(&self, failure: &TokenFailure) {
        if let Err(e) = self
            .ui
            .notify(failure.notification_text(), NotifyLevel::Warning, NotifyPosition::TopRight)
            .await
        {
            shared::tool_warn!("Could not notify failure for {:?}: {}", failure.token, e);
        }
    }

    async fn on_complete(&self, _report: &BatchReport) {}
}
