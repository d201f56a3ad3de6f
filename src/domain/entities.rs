//! Domain entities: widget kinds and their payloads

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Direction a layout arranges its children in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Horizontal,
    Vertical,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alignment::Horizontal => write!(f, "Horizontal"),
            Alignment::Vertical => write!(f, "Vertical"),
        }
    }
}

/// Payload of a widget node. The set of kinds is closed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Top-level window; exactly one per tree
    Root { title: String },
    Layout { alignment: Alignment },
    TextField { max_length: u32 },
    /// Ordered items; may be empty
    ChoiceList { items: Vec<String> },
}

impl WidgetKind {
    pub fn is_root(&self) -> bool {
        matches!(self, WidgetKind::Root { .. })
    }

    /// Human-readable kind name without payload.
    pub fn name(&self) -> &'static str {
        match self {
            WidgetKind::Root { .. } => "Root",
            WidgetKind::Layout { .. } => "Layout",
            WidgetKind::TextField { .. } => "TextField",
            WidgetKind::ChoiceList { .. } => "ChoiceList",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetKind::Root { title } => write!(f, "Root({:?})", title),
            WidgetKind::Layout { alignment } => write!(f, "Layout({})", alignment),
            WidgetKind::TextField { max_length } => write!(f, "TextField({})", max_length),
            WidgetKind::ChoiceList { items } => {
                write!(f, "ChoiceList([{}])", items.iter().map(|i| format!("{:?}", i)).join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_choice_list_when_displayed_then_quotes_items() {
        let kind = WidgetKind::ChoiceList {
            items: vec!["a".into(), "b/c".into()],
        };
        assert_eq!(kind.to_string(), r#"ChoiceList(["a", "b/c"])"#);
    }

    #[test]
    fn given_kinds_when_checking_root_then_only_root_matches() {
        assert!(WidgetKind::Root { title: String::new() }.is_root());
        assert!(!WidgetKind::TextField { max_length: 1 }.is_root());
    }
}
