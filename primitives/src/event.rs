//! Events emitted by transaction execution and block-boundary processing.
//!
//! Events are ordered lists of key/value tags handed to the consensus
//! engine for external indexing. They are not part of the state root.

use serde::{Deserialize, Serialize};

/// An emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event type identifier, e.g. `"transfer"` or `"wakeup"`.
    pub kind: String,
    /// Ordered key/value attributes.
    pub attributes: Vec<EventAttribute>,
}

/// A single key/value attribute within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute, builder style.
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    /// Look up the first attribute with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder_preserves_order() {
        let event = Event::new("transfer")
            .attr("sender", "AA")
            .attr("recipient", "BB")
            .attr("amount", 10u64);
        assert_eq!(event.kind, "transfer");
        let keys: Vec<&str> = event.attributes.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["sender", "recipient", "amount"]);
        assert_eq!(event.get("amount"), Some("10"));
        assert_eq!(event.get("missing"), None);
    }
}
