//! Shared page layer for small internal tools
//!
//! A tool registers one or more [`Page`]s on a [`PageRouter`] and hands the
//! router to a [`ToolServer`]. Each browser connection gets its own
//! [`PageSession`], which builds and updates the page through a [`UiHandle`].

pub mod errors;
pub mod logging;
pub mod messages;
pub mod page;
pub mod server;
pub mod session;
pub mod types;
pub mod ui;

pub use errors::*;
pub use types::*;

pub use messages::{NotifyLevel, NotifyPosition, PageEvent, UiUpdate};
pub use page::{MockPageSession, Page, PageRouter, PageSession};
pub use server::{ToolServer, resolve_bind_addr};
pub use session::{Download, DownloadStore, SessionEntry, SessionRegistry};
pub use ui::UiHandle;
