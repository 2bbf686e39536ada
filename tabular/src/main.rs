//! Tabular tool entry point

use clap::Parser;
use shared::logging::{self, TracingEndpoint};
use shared::{PageRouter, ToolId, ToolServer, resolve_bind_addr, tool_info};

use tabular_tool::{TabularError, TabularPage, TabularResult};

#[derive(Parser, Debug)]
#[command(name = "tabular-tool")]
#[command(about = "Runs the core function over comma-separated inputs and exports a CSV")]
struct Args {
    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port for HTTP server (browser connections)
    #[arg(long, default_value = "8081")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Tracing endpoint URL (if set, traces will be sent here)
    #[arg(long)]
    trace_ep: Option<String>,
}

#[tokio::main]
async fn main() -> TabularResult<()> {
    let args = Args::parse();

    // Placeholder for tool settings; nothing is required yet
    let _ = dotenv::dotenv();

    ToolId::init_tabular();
    logging::init_tracing_with_endpoint_and_level(
        args.trace_ep.map(TracingEndpoint::new),
        Some(&args.log_level),
    );

    let addr = resolve_bind_addr(&args.host, args.port)
        .await
        .map_err(|e| TabularError::ConfigError { message: e.to_string() })?;

    let pages = PageRouter::new().page("/", TabularPage::with_core_function());
    ToolServer::new(pages).run(addr).await?;

    tool_info!("Tabular tool stopped gracefully");
    Ok(())
}
