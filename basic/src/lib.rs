//! Basic tool template
//!
//! The simplest tool: a page with a button that runs [`core_function`] and
//! shows what it returns. Replace [`core_function`] with the tool's logic;
//! it must not touch the UI.

use async_trait::async_trait;
use shared::{ElementId, Page, PageSession, ToolError, ToolResult, UiHandle};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

pub const PAGE_TITLE: &str = "Basic tool";
pub const GREETING: &str = "Hello, world!";
pub const RUN_BUTTON: &str = "Click me!";

/// Basic tool error types
#[derive(Error, Debug)]
pub enum BasicError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Page error: {0}")]
    PageError(#[from] ToolError),
}

pub type BasicResult<T> = Result<T, BasicError>;

/// Zero-argument computation run on click
#[mockall::automock]
pub trait Action: Send + Sync {
    fn run(&self) -> anyhow::Result<String>;
}

impl<F> Action for F
where
    F: Fn() -> anyhow::Result<String> + Send + Sync,
{
    fn run(&self) -> anyhow::Result<String> {
        self()
    }
}

/// The template's placeholder computation
pub fn core_function() -> anyhow::Result<String> {
    Ok("I'm functioning!".to_string())
}

/// Page with a greeting and one button
pub struct BasicPage {
    action: Arc<dyn Action>,
}

impl BasicPage {
    pub fn new(action: Arc<dyn Action>) -> Self {
        Self { action }
    }

    pub fn with_core_function() -> Self {
        Self::new(Arc::new(core_function))
    }
}

impl Page for BasicPage {
    fn title(&self) -> &str {
        PAGE_TITLE
    }

    fn create_session(&self) -> Arc<dyn PageSession> {
        Arc::new(BasicSession {
            action: self.action.clone(),
            run_button: OnceLock::new(),
        })
    }
}

struct BasicSession {
    action: Arc<dyn Action>,
    run_button: OnceLock<ElementId>,
}

#[async_trait]
impl PageSession for BasicSession {
    async fn mount(&self, ui: &UiHandle) -> ToolResult<()> {
        ui.label(GREETING).await?;
        let button = ui.button(RUN_BUTTON).await?;
        if self.run_button.set(button).is_err() {
            shared::tool_warn!("Session {} mounted twice; keeping first button", ui.session_id());
        }
        Ok(())
    }

    /// Runs the action synchronously; its failure is returned to the page layer
    async fn on_click(&self, element: &ElementId, ui: &UiHandle) -> ToolResult<()> {
        if self.run_button.get() != Some(element) {
            return Ok(());
        }
        let text = self.action.run().map_err(ToolError::handler)?;
        ui.label(text).await?;
        Ok(())
    }
}
