//! Purpose: Shape harness output events for text and JSON-lines rendering.
//! Exports: `Event`.
//! Role: One event per observable script step; failures are events, not errors.
//! Invariants: Text lines stay stable because fixtures compare against them.
//! Invariants: JSON objects always carry an `op` tag; fields are additive-only.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum Event {
    Print {
        element_size: usize,
        size: usize,
        top: Option<i64>,
    },
    Peek {
        top: Option<i64>,
    },
    Size {
        size: usize,
    },
    Empty {
        empty: bool,
    },
    Failed {
        target: &'static str,
        kind: String,
        message: String,
        line: usize,
    },
}

impl Event {
    pub(crate) fn text(&self) -> String {
        match self {
            Event::Print {
                element_size,
                size,
                top,
            } => format!(
                "Stack data size: {element_size} | Stack size: {size} | Data: {}",
                top_text(*top)
            ),
            Event::Peek { top } => format!("Peek: {}", top_text(*top)),
            Event::Size { size } => format!("Size: {size}"),
            Event::Empty { empty } => format!("Empty: {empty}"),
            Event::Failed {
                target, message, ..
            } => format!("{target} failed: {message}"),
        }
    }
}

fn top_text(top: Option<i64>) -> String {
    match top {
        Some(value) => value.to_string(),
        None => "Empty".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::Event;
    use serde_json::json;

    #[test]
    fn print_text_matches_status_line() {
        let event = Event::Print {
            element_size: 4,
            size: 2,
            top: Some(1000),
        };
        assert_eq!(
            event.text(),
            "Stack data size: 4 | Stack size: 2 | Data: 1000"
        );
        let empty = Event::Print {
            element_size: 4,
            size: 0,
            top: None,
        };
        assert_eq!(empty.text(), "Stack data size: 4 | Stack size: 0 | Data: Empty");
    }

    #[test]
    fn json_is_tagged_by_op() {
        let event = Event::Failed {
            target: "pop",
            kind: "Empty".to_string(),
            message: "stack is empty".to_string(),
            line: 3,
        };
        assert_eq!(
            serde_json::to_value(&event).expect("json"),
            json!({"op": "failed", "target": "pop", "kind": "Empty", "message": "stack is empty", "line": 3})
        );
        let peek = Event::Peek { top: None };
        assert_eq!(
            serde_json::to_value(&peek).expect("json"),
            json!({"op": "peek", "top": null})
        );
    }
}
