//! Wire messages between the browser page and its server-side session
//!
//! Both directions are JSON objects tagged by a `type` field.

use serde::{Deserialize, Serialize};

use crate::types::{ElementId, Row};

/// Events raised by the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// A button was clicked
    Click { element: ElementId },
    /// An input's value changed
    Change { element: ElementId, value: String },
}

/// Updates pushed to the browser; each creates, changes or removes an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiUpdate {
    Label {
        element: ElementId,
        text: String,
    },
    TextArea {
        element: ElementId,
        label: String,
    },
    Button {
        element: ElementId,
        text: String,
    },
    Separator {
        element: ElementId,
    },
    /// Progress indicator with a caption
    Spinner {
        element: ElementId,
        text: String,
    },
    Table {
        element: ElementId,
        columns: Vec<String>,
    },
    AddRows {
        element: ElementId,
        rows: Vec<Row>,
    },
    Delete {
        element: ElementId,
    },
    /// Transient notification
    Notify {
        message: String,
        level: NotifyLevel,
        position: NotifyPosition,
    },
    /// Ask the browser to fetch a registered download
    Download {
        url: String,
        filename: String,
    },
}

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyLevel {
    Positive,
    Negative,
    Warning,
    Info,
}

/// Where a notification appears on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    #[default]
    Bottom,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_event_parsing() {
        let click: PageEvent = serde_json::from_str(r#"{"type":"click","element":"e3"}"#).unwrap();
        assert_eq!(
            click,
            PageEvent::Click {
                element: ElementId::from("e3")
            }
        );

        let change: PageEvent =
            serde_json::from_str(r#"{"type":"change","element":"e1","value":"a,b"}"#).unwrap();
        assert_eq!(
            change,
            PageEvent::Change {
                element: ElementId::from("e1"),
                value: "a,b".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result = serde_json::from_str::<PageEvent>(r#"{"type":"hover","element":"e1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_notify_wire_shape() {
        let update = UiUpdate::Notify {
            message: "Error getting data from x: boom".to_string(),
            level: NotifyLevel::Warning,
            position: NotifyPosition::TopRight,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "type": "notify",
                "message": "Error getting data from x: boom",
                "level": "warning",
                "position": "top-right"
            })
        );
    }

    #[test]
    fn test_add_rows_wire_shape() {
        let update = UiUpdate::AddRows {
            element: ElementId::from("e7"),
            rows: vec![vec!["a".to_string(), "ok".to_string()]],
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"type": "add_rows", "element": "e7", "rows": [["a", "ok"]]})
        );
    }
}
