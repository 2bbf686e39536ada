//! Tool logging: per-tool filters, stdout output and optional trace shipping
//!
//! Events logged through [`tool_info!`], [`tool_warn!`] and [`tool_error!`]
//! carry `tool` and `timestamp` fields. With a trace endpoint configured,
//! those events (and only those) are batched and posted as JSON; a `session`
//! field tags the event with the page session it belongs to.

use crate::types::ToolId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::Context;

/// Where and how often trace batches are posted
#[derive(Debug, Clone)]
pub struct TracingEndpoint {
    pub url: String,
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl TracingEndpoint {
    pub fn new(url: String) -> Self {
        Self {
            url,
            batch_size: 5,
            flush_interval: Duration::from_millis(500),
        }
    }
}

/// One tool event as posted to the trace endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    pub message: String,
    pub fields: Map<String, Value>,
}

impl TraceEvent {
    /// `None` unless the event came from one of the `tool_*` macros
    fn from_event(event: &Event<'_>) -> Option<Self> {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let tool = into_text(collector.fields.remove("tool")?);
        let session = collector.fields.remove("session").map(into_text);
        // The macro's wall-clock string is superseded by `timestamp`
        collector.fields.remove("timestamp");

        let metadata = event.metadata();
        Some(Self {
            timestamp: Utc::now(),
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            tool,
            session,
            message: collector.message,
            fields: collector.fields,
        })
    }
}

fn into_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = into_text(value);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }
}

/// Layer forwarding tool events to a background [`TraceShipper`]
///
/// Must be created inside a tokio runtime.
pub struct HttpTracingLayer {
    sender: mpsc::UnboundedSender<TraceEvent>,
}

impl HttpTracingLayer {
    pub fn new(endpoint: TracingEndpoint) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(TraceShipper::new(endpoint).run(receiver));
        Self { sender }
    }
}

impl<S> tracing_subscriber::Layer<S> for HttpTracingLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if let Some(trace_event) = TraceEvent::from_event(event) {
            let _ = self.sender.send(trace_event);
        }
    }
}

/// Batches trace events and posts them to the endpoint
struct TraceShipper {
    client: reqwest::Client,
    endpoint: TracingEndpoint,
    pending: Vec<TraceEvent>,
}

impl TraceShipper {
    fn new(endpoint: TracingEndpoint) -> Self {
        Self {
            client: reqwest::Client::new(),
            pending: Vec::with_capacity(endpoint.batch_size),
            endpoint,
        }
    }

    /// Ship until every sender is gone, then flush what is left
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<TraceEvent>) {
        let mut ticker = tokio::time::interval(self.endpoint.flush_interval);
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.pending.push(event);
                        if self.pending.len() >= self.endpoint.batch_size {
                            self.flush().await;
                        }
                    }
                    None => {
                        self.flush().await;
                        break;
                    }
                },
                _ = ticker.tick() => self.flush().await,
            }
        }
    }

    async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.pending);

        // Reporting through tracing would loop back into the layer
        let result = self
            .client
            .post(&self.endpoint.url)
            .json(&batch)
            .send()
            .await
            .and_then(|response| response.error_for_status());
        if let Err(e) = result {
            eprintln!("❌ Dropped {} trace events for {}: {e}", batch.len(), self.endpoint.url);
        }
    }
}

/// Env filter directive for `tool` at `log_level` (default `info`)
pub fn filter_directive(tool: ToolId, log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    match tool {
        ToolId::Library => format!("shared={base_level},tower_http=warn,axum={base_level}"),
        tool => format!(
            "{}={base_level},shared={base_level},tower_http=warn,axum={base_level}",
            tool.log_target()
        ),
    }
}

/// Install the global subscriber for the current tool
///
/// `RUST_LOG`, when set, replaces the per-tool directive.
pub fn init_tracing_with_endpoint_and_level(endpoint: Option<TracingEndpoint>, log_level: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(ToolId::current(), log_level)));
    let endpoint_url = endpoint.as_ref().map(|endpoint| endpoint.url.clone());

    tracing_subscriber::registry()
        .with(filter)
        .with(endpoint.map(HttpTracingLayer::new))
        .with(fmt::layer().with_target(false).compact())
        .init();

    if let Some(url) = endpoint_url {
        crate::tool_info!("📡 Shipping traces to {}", url);
    }
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for tool-aware info logging
#[macro_export]
macro_rules! tool_info {
    ($($arg:tt)*) => {
        tracing::info!(
            tool = %$crate::ToolId::current(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        )
    };
}

/// Macro for tool-aware warning logging
#[macro_export]
macro_rules! tool_warn {
    ($($arg:tt)*) => {
        tracing::warn!(
            tool = %$crate::ToolId::current(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        )
    };
}

/// Macro for tool-aware error logging
#[macro_export]
macro_rules! tool_error {
    ($($arg:tt)*) => {
        tracing::error!(
            tool = %$crate::ToolId::current(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        )
    };
}
