//! Page and page-session traits, and the router mapping paths to pages
//!
//! A [`Page`] is registered once per path. Every browser connection to that
//! path gets its own [`PageSession`], which owns whatever state the tool
//! keeps for that visitor.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::{ToolError, ToolResult};
use crate::types::ElementId;
use crate::ui::UiHandle;

/// Server-side state and callbacks for one browser connection
#[mockall::automock]
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Render the initial elements
    async fn mount(&self, ui: &UiHandle) -> ToolResult<()>;

    /// Handle a click on `element`
    ///
    /// Each click runs in its own task, so a session may see several
    /// concurrent calls.
    async fn on_click(&self, element: &ElementId, ui: &UiHandle) -> ToolResult<()>;
}

/// A routable page that builds sessions
pub trait Page: Send + Sync {
    fn title(&self) -> &str;

    fn create_session(&self) -> Arc<dyn PageSession>;
}

/// Path to page mapping
#[derive(Clone, Default)]
pub struct PageRouter {
    pages: BTreeMap<String, Arc<dyn Page>>,
}

impl PageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `page` at `path`, replacing any page already there
    pub fn page(mut self, path: impl Into<String>, page: impl Page + 'static) -> Self {
        self.pages.insert(path.into(), Arc::new(page));
        self
    }

    pub fn get(&self, path: &str) -> ToolResult<Arc<dyn Page>> {
        self.pages
            .get(path)
            .cloned()
            .ok_or_else(|| ToolError::UnknownPage { path: path.to_string() })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Page>)> {
        self.pages.iter().map(|(path, page)| (path.as_str(), page))
    }

    pub fn paths(&self) -> Vec<String> {
        self.pages.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticPage;

    impl Page for StaticPage {
        fn title(&self) -> &str {
            "Static"
        }

        fn create_session(&self) -> Arc<dyn PageSession> {
            let mut session = MockPageSession::new();
            session.expect_mount().returning(|_| Ok(()));
            Arc::new(session)
        }
    }

    #[test]
    fn test_router_lookup() {
        let router = PageRouter::new().page("/", StaticPage);

        assert_eq!(router.get("/").unwrap().title(), "Static");
        assert_eq!(router.paths(), vec!["/".to_string()]);
        assert!(matches!(router.get("/missing"), Err(ToolError::UnknownPage { .. })));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let router = PageRouter::new().page("/", StaticPage);
        let page = router.get("/").unwrap();

        let first = page.create_session();
        let second = page.create_session();
        assert!(!Arc::ptr_eq(&first, &second));

        let (ui, _rx) = UiHandle::channel(crate::SessionId::new(), 4);
        assert!(first.mount(&ui).await.is_ok());
    }
}
