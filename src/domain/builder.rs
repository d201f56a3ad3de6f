//! Widget trees from declarative descriptions
//!
//! A description is a TOML document with a window `title` and nested
//! `[[children]]` tables, each tagged with a `kind`:
//!
//! ```toml
//! title = "Application"
//!
//! [[children]]
//! kind = "layout"
//! alignment = "horizontal"
//!
//!   [[children.children]]
//!   kind = "text_field"
//!   max_length = 20
//! ```

use std::collections::HashMap;
use std::mem;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{Alignment, DomainError, DomainResult, NodeId, WidgetKind, WidgetTree};

/// Top-level description: the root window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDescription {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<WidgetDescription>,
}

/// Description of one non-root widget and its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetDescription {
    Layout {
        alignment: Alignment,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<WidgetDescription>,
    },
    TextField {
        max_length: u32,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<WidgetDescription>,
    },
    ChoiceList {
        #[serde(default)]
        items: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<WidgetDescription>,
    },
}

impl WidgetDescription {
    fn children_mut(&mut self) -> &mut Vec<WidgetDescription> {
        match self {
            WidgetDescription::Layout { children, .. }
            | WidgetDescription::TextField { children, .. }
            | WidgetDescription::ChoiceList { children, .. } => children,
        }
    }

    fn split(&self) -> (WidgetKind, &[WidgetDescription]) {
        match self {
            WidgetDescription::Layout {
                alignment,
                children,
            } => (
                WidgetKind::Layout {
                    alignment: *alignment,
                },
                children,
            ),
            WidgetDescription::TextField {
                max_length,
                children,
            } => (
                WidgetKind::TextField {
                    max_length: *max_length,
                },
                children,
            ),
            WidgetDescription::ChoiceList { items, children } => (
                WidgetKind::ChoiceList {
                    items: items.clone(),
                },
                children,
            ),
        }
    }

    fn from_kind(kind: &WidgetKind, children: Vec<WidgetDescription>) -> Option<Self> {
        match kind {
            WidgetKind::Root { .. } => None,
            WidgetKind::Layout { alignment } => Some(WidgetDescription::Layout {
                alignment: *alignment,
                children,
            }),
            WidgetKind::TextField { max_length } => Some(WidgetDescription::TextField {
                max_length: *max_length,
                children,
            }),
            WidgetKind::ChoiceList { items } => Some(WidgetDescription::ChoiceList {
                items: items.clone(),
                children,
            }),
        }
    }
}

// Flattens nested children before they drop, so deep descriptions do not
// unwind one stack frame per level.
impl Drop for WidgetDescription {
    fn drop(&mut self) {
        let mut pending = mem::take(self.children_mut());
        while let Some(mut description) = pending.pop() {
            pending.append(description.children_mut());
        }
    }
}

pub struct TreeBuilder {
    description: WindowDescription,
}

impl TreeBuilder {
    pub fn new(description: WindowDescription) -> Self {
        Self { description }
    }

    #[instrument(level = "debug", skip(input))]
    pub fn from_toml(input: &str) -> DomainResult<Self> {
        let description: WindowDescription =
            toml::from_str(input).map_err(|e| DomainError::InvalidDescription {
                message: e.to_string(),
            })?;
        Ok(Self::new(description))
    }

    /// Builds the tree, attaching children in description order.
    #[instrument(level = "debug", skip(self))]
    pub fn build(&self) -> DomainResult<WidgetTree> {
        let mut tree = WidgetTree::new(self.description.title.clone());
        let mut stack: Vec<(NodeId, &[WidgetDescription])> =
            vec![(tree.root(), self.description.children.as_slice())];

        // Siblings are attached in order before descending, so child order
        // matches the description even though subtrees are built off a stack.
        while let Some((parent_idx, children)) = stack.pop() {
            for child in children {
                let (kind, grandchildren) = child.split();
                let child_idx = tree.insert(parent_idx, kind)?;
                if !grandchildren.is_empty() {
                    stack.push((child_idx, grandchildren));
                }
            }
        }

        debug!("built tree with {} nodes", tree.len());
        Ok(tree)
    }
}

/// Inverse of [`TreeBuilder::build`]: the description that rebuilds `tree`.
///
/// Subtrees are assembled bottom-up in reverse pre-order, so every node's
/// children are complete before the node itself is described.
#[instrument(level = "debug", skip(tree))]
pub fn describe(tree: &WidgetTree) -> WindowDescription {
    let order: Vec<NodeId> = tree.iter().map(|(idx, _)| idx).collect();
    // Reverse pre-order visits siblings last to first, so lists fill backwards
    let mut described: HashMap<NodeId, Vec<WidgetDescription>> = HashMap::new();

    for &idx in order.iter().rev() {
        let (Some(kind), Some(parent)) = (tree.kind(idx), tree.parent(idx)) else {
            continue;
        };
        let mut children = described.remove(&idx).unwrap_or_default();
        children.reverse();
        if let Some(description) = WidgetDescription::from_kind(kind, children) {
            described.entry(parent).or_default().push(description);
        }
    }

    let mut children = described.remove(&tree.root()).unwrap_or_default();
    children.reverse();
    let title = match tree.kind(tree.root()) {
        Some(WidgetKind::Root { title }) => title.clone(),
        _ => String::new(),
    };
    WindowDescription { title, children }
}

/// Deepest tree [`describe_toml`] accepts; the TOML serializer recurses per level.
pub const MAX_TOML_DEPTH: usize = 256;

/// Serializes the description of `tree` as TOML.
pub fn describe_toml(tree: &WidgetTree) -> DomainResult<String> {
    let depth = tree.depth();
    if depth > MAX_TOML_DEPTH {
        return Err(DomainError::InvalidDescription {
            message: format!(
                "tree depth {} exceeds {} levels of nested tables",
                depth, MAX_TOML_DEPTH
            ),
        });
    }
    toml::to_string_pretty(&describe(tree)).map_err(|e| DomainError::InvalidDescription {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::demo_tree;

    const APPLICATION: &str = r#"
title = "Application"

[[children]]
kind = "layout"
alignment = "horizontal"

  [[children.children]]
  kind = "text_field"
  max_length = 20

  [[children.children]]
  kind = "text_field"
  max_length = 30

[[children]]
kind = "layout"
alignment = "vertical"

  [[children.children]]
  kind = "choice_list"
  items = ["1", "2", "3", "4"]

  [[children.children]]
  kind = "choice_list"
  items = ["a", "b", "c"]
"#;

    #[test]
    fn given_application_description_when_building_then_matches_demo_tree() {
        let tree = TreeBuilder::from_toml(APPLICATION).unwrap().build().unwrap();
        assert!(tree.is_isomorphic(&demo_tree()));
    }

    #[test]
    fn given_choice_list_without_items_when_building_then_empty_list() {
        let input = r#"
title = "w"

[[children]]
kind = "choice_list"
"#;
        let tree = TreeBuilder::from_toml(input).unwrap().build().unwrap();
        let child = tree.children(tree.root())[0];
        assert_eq!(
            tree.kind(child),
            Some(&WidgetKind::ChoiceList { items: vec![] })
        );
    }

    #[test]
    fn given_unknown_kind_when_parsing_then_invalid_description() {
        let input = r#"
title = "w"

[[children]]
kind = "slider"
"#;
        let result = TreeBuilder::from_toml(input);
        assert!(matches!(
            result,
            Err(DomainError::InvalidDescription { .. })
        ));
    }

    #[test]
    fn given_tree_when_described_then_rebuilds_same_shape() {
        let description = describe(&demo_tree());
        let rebuilt = TreeBuilder::new(description).build().unwrap();
        assert!(rebuilt.is_isomorphic(&demo_tree()));
    }

    #[test]
    fn given_leaves_with_children_when_described_then_order_kept() {
        let mut tree = WidgetTree::new("w");
        let root = tree.root();
        let field = tree.add_text_field(root, 1).unwrap();
        tree.add_layout(field, Alignment::Vertical).unwrap();
        tree.add_choice_list(field, ["x"]).unwrap();
        tree.add_text_field(root, 2).unwrap();

        let description = describe(&tree);
        assert_eq!(description.children.len(), 2);
        let rebuilt = TreeBuilder::new(description).build().unwrap();
        assert!(rebuilt.is_isomorphic(&tree));
    }

    #[test]
    fn given_deep_chain_when_described_then_every_level_present() {
        const DEPTH: usize = 100_000;
        let mut tree = WidgetTree::new("deep");
        let mut parent = tree.root();
        for _ in 0..DEPTH {
            parent = tree.add_layout(parent, Alignment::Vertical).unwrap();
        }

        let description = describe(&tree);
        let mut level = description.children.as_slice();
        let mut layouts = 0;
        while let [WidgetDescription::Layout { children, .. }] = level {
            layouts += 1;
            level = children.as_slice();
        }
        assert_eq!(layouts, DEPTH);
        assert!(level.is_empty());

        let rebuilt = TreeBuilder::new(description).build().unwrap();
        assert!(rebuilt.is_isomorphic(&tree));
    }

    #[test]
    fn given_tree_deeper_than_toml_limit_when_described_as_toml_then_rejected() {
        let mut tree = WidgetTree::new("deep");
        let mut parent = tree.root();
        for _ in 0..MAX_TOML_DEPTH {
            parent = tree.add_layout(parent, Alignment::Vertical).unwrap();
        }
        let result = describe_toml(&tree);
        assert!(matches!(
            result,
            Err(DomainError::InvalidDescription { .. })
        ));
    }

    #[test]
    fn given_tree_when_described_as_toml_then_parses_back() {
        let toml = describe_toml(&demo_tree()).unwrap();
        let rebuilt = TreeBuilder::from_toml(&toml).unwrap().build().unwrap();
        assert!(rebuilt.is_isomorphic(&demo_tree()));
    }
}
