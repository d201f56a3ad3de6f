use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::{Alignment, DomainError, DomainResult, WidgetKind};

/// Non-owning handle to a node inside a [`WidgetTree`].
///
/// Handles compare by identity: two layouts with the same alignment are
/// still distinct nodes.
pub type NodeId = Index;

/// Tree node in the arena-based widget hierarchy.
#[derive(Debug)]
pub struct WidgetNode {
    /// Kind and payload, fixed at construction
    pub kind: WidgetKind,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<NodeId>,
    /// Indices of child nodes in attachment order
    pub children: Vec<NodeId>,
}

/// Arena-based widget tree.
///
/// The root is created together with the tree. Every other node is attached
/// to an existing parent at construction and stays there; nodes are never
/// removed or reparented, so the arena only grows.
#[derive(Debug)]
pub struct WidgetTree {
    arena: Arena<WidgetNode>,
    root: NodeId,
}

impl WidgetTree {
    pub fn new(title: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(WidgetNode {
            kind: WidgetKind::Root {
                title: title.into(),
            },
            parent: None,
            children: Vec::new(),
        });
        Self { arena, root }
    }

    /// Attaches a new node as the last child of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn insert(&mut self, parent: NodeId, kind: WidgetKind) -> DomainResult<NodeId> {
        if kind.is_root() {
            return Err(DomainError::RootAlreadyPresent);
        }
        if !self.arena.contains(parent) {
            return Err(DomainError::InvalidParent(parent));
        }
        Ok(self.attach(parent, kind))
    }

    /// Appends a non-root node under a parent already known to be live.
    fn attach(&mut self, parent: NodeId, kind: WidgetKind) -> NodeId {
        let node_idx = self.arena.insert(WidgetNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(node_idx);
        }
        node_idx
    }

    pub fn add_layout(&mut self, parent: NodeId, alignment: Alignment) -> DomainResult<NodeId> {
        self.insert(parent, WidgetKind::Layout { alignment })
    }

    pub fn add_text_field(&mut self, parent: NodeId, max_length: u32) -> DomainResult<NodeId> {
        self.insert(parent, WidgetKind::TextField { max_length })
    }

    pub fn add_choice_list<I, S>(&mut self, parent: NodeId, items: I) -> DomainResult<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.insert(parent, WidgetKind::ChoiceList { items })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, idx: NodeId) -> Option<&WidgetNode> {
        self.arena.get(idx)
    }

    pub fn kind(&self, idx: NodeId) -> Option<&WidgetKind> {
        self.get(idx).map(|node| &node.kind)
    }

    pub fn parent(&self, idx: NodeId) -> Option<NodeId> {
        self.get(idx).and_then(|node| node.parent)
    }

    pub fn children(&self, idx: NodeId) -> &[NodeId] {
        self.get(idx).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// A tree always holds its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Depth-first pre-order traversal starting at the root.
    pub fn iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for &child in self.children(idx) {
                stack.push((child, depth + 1));
            }
        }
        max_depth
    }

    /// Nodes without children, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Zero-based rank of `idx` among its parent's children. The root has rank 0.
    pub fn sibling_index(&self, idx: NodeId) -> Option<usize> {
        let node = self.get(idx)?;
        match node.parent {
            None => Some(0),
            Some(parent) => self.children(parent).iter().position(|&c| c == idx),
        }
    }

    /// Slot value written into the positional header of `idx`.
    ///
    /// The root inherits 0; every other node inherits its parent's own slot.
    pub fn inherited_slot(&self, idx: NodeId) -> Option<usize> {
        match self.get(idx)?.parent {
            None => Some(0),
            Some(parent) => self.own_slot(parent),
        }
    }

    /// Slot value the children of `idx` inherit.
    ///
    /// Root: its inherited slot. Others: inherited + 1 + sibling index.
    pub fn own_slot(&self, idx: NodeId) -> Option<usize> {
        let inherited = self.inherited_slot(idx)?;
        if self.get(idx)?.kind.is_root() {
            return Some(inherited);
        }
        Some(inherited + 1 + self.sibling_index(idx)?)
    }

    /// Same kinds, same payloads and same child order at every node.
    #[instrument(level = "debug", skip_all)]
    pub fn is_isomorphic(&self, other: &WidgetTree) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut stack = vec![(self.root, other.root)];
        while let Some((a, b)) = stack.pop() {
            let (Some(node_a), Some(node_b)) = (self.get(a), other.get(b)) else {
                return false;
            };
            if node_a.kind != node_b.kind || node_a.children.len() != node_b.children.len() {
                return false;
            }
            stack.extend(node_a.children.iter().copied().zip(node_b.children.iter().copied()));
        }
        true
    }
}

/// Display walk step: a node to print, or the bracket closing a child list.
enum Step {
    Node { idx: NodeId, first: bool },
    Close,
}

impl fmt::Display for WidgetTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![Step::Node {
            idx: self.root,
            first: true,
        }];
        while let Some(step) = stack.pop() {
            let (idx, first) = match step {
                Step::Close => {
                    write!(f, "]")?;
                    continue;
                }
                Step::Node { idx, first } => (idx, first),
            };
            let Some(node) = self.get(idx) else {
                continue;
            };
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", node.kind)?;
            if node.children.is_empty() {
                continue;
            }
            write!(f, "[")?;
            stack.push(Step::Close);
            for (rank, &child) in node.children.iter().enumerate().rev() {
                stack.push(Step::Node {
                    idx: child,
                    first: rank == 0,
                });
            }
        }
        Ok(())
    }
}

pub struct PreOrderIter<'a> {
    tree: &'a WidgetTree,
    stack: Vec<NodeId>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a WidgetTree) -> Self {
        Self {
            tree,
            stack: vec![tree.root],
        }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = (NodeId, &'a WidgetNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.tree.get(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

/// The "Application" window: two layouts holding two text fields and two
/// choice lists.
pub fn demo_tree() -> WidgetTree {
    let mut tree = WidgetTree::new("Application");
    let root = tree.root();
    // Every parent is created right here, so the unchecked attach cannot miss
    let horizontal = tree.attach(root, WidgetKind::Layout {
        alignment: Alignment::Horizontal,
    });
    let vertical = tree.attach(root, WidgetKind::Layout {
        alignment: Alignment::Vertical,
    });
    tree.attach(horizontal, WidgetKind::TextField { max_length: 20 });
    tree.attach(horizontal, WidgetKind::TextField { max_length: 30 });
    tree.attach(vertical, WidgetKind::ChoiceList {
        items: ["1", "2", "3", "4"].map(String::from).to_vec(),
    });
    tree.attach(vertical, WidgetKind::ChoiceList {
        items: ["a", "b", "c"].map(String::from).to_vec(),
    });
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_new_tree_when_created_then_root_has_no_parent() {
        let tree = WidgetTree::new("main");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(
            tree.kind(tree.root()),
            Some(&WidgetKind::Root {
                title: "main".into()
            })
        );
    }

    #[test]
    fn given_second_root_when_inserting_then_rejected() {
        let mut tree = WidgetTree::new("main");
        let root = tree.root();
        let result = tree.insert(
            root,
            WidgetKind::Root {
                title: "other".into(),
            },
        );
        assert_eq!(result, Err(DomainError::RootAlreadyPresent));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn given_foreign_handle_when_inserting_then_invalid_parent() {
        let mut other = WidgetTree::new("other");
        let other_root = other.root();
        let foreign = other.add_text_field(other_root, 3).unwrap();

        let mut tree = WidgetTree::new("main");
        let result = tree.add_layout(foreign, Alignment::Vertical);
        assert_eq!(result, Err(DomainError::InvalidParent(foreign)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn given_identical_payloads_when_inserted_then_nodes_are_distinct() {
        let mut tree = WidgetTree::new("main");
        let root = tree.root();
        let a = tree.add_layout(root, Alignment::Vertical).unwrap();
        let b = tree.add_layout(root, Alignment::Vertical).unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.children(root), &[a, b]);
    }

    #[test]
    fn given_demo_tree_when_computing_slots_then_follow_sibling_rank() {
        let tree = demo_tree();
        let root = tree.root();
        let layouts = tree.children(root).to_vec();

        assert_eq!(tree.own_slot(root), Some(0));
        assert_eq!(tree.inherited_slot(layouts[0]), Some(0));
        assert_eq!(tree.inherited_slot(layouts[1]), Some(0));
        assert_eq!(tree.own_slot(layouts[0]), Some(1));
        assert_eq!(tree.own_slot(layouts[1]), Some(2));

        for &grandchild in tree.children(layouts[0]) {
            assert_eq!(tree.inherited_slot(grandchild), Some(1));
        }
        for &grandchild in tree.children(layouts[1]) {
            assert_eq!(tree.inherited_slot(grandchild), Some(2));
        }
    }

    #[test]
    fn given_demo_tree_when_iterating_then_pre_order() {
        let tree = demo_tree();
        let names: Vec<_> = tree.iter().map(|(_, n)| n.kind.name()).collect();
        assert_eq!(
            names,
            vec![
                "Root",
                "Layout",
                "TextField",
                "TextField",
                "Layout",
                "ChoiceList",
                "ChoiceList"
            ]
        );
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaves().len(), 4);
    }

    #[test]
    fn given_demo_tree_when_displayed_then_nested_form() {
        let expected = concat!(
            r#"Root("Application")[Layout(Horizontal)[TextField(20), TextField(30)], "#,
            r#"Layout(Vertical)[ChoiceList(["1", "2", "3", "4"]), ChoiceList(["a", "b", "c"])]]"#
        );
        assert_eq!(demo_tree().to_string(), expected);
    }

    #[test]
    fn given_deep_chain_when_displayed_then_brackets_balance() {
        const DEPTH: usize = 100_000;
        let mut tree = WidgetTree::new("deep");
        let mut parent = tree.root();
        for _ in 0..DEPTH {
            parent = tree.add_layout(parent, Alignment::Horizontal).unwrap();
        }
        tree.add_text_field(parent, 1).unwrap();

        let shown = tree.to_string();
        assert!(shown.starts_with(r#"Root("deep")[Layout(Horizontal)[Layout(Horizontal)["#));
        assert!(shown.ends_with(&format!("TextField(1){}", "]".repeat(DEPTH + 1))));
        assert_eq!(shown.matches("Layout(Horizontal)").count(), DEPTH);
    }

    #[test]
    fn given_demo_tree_when_built_then_seven_nodes() {
        let tree = demo_tree();
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.children(tree.root()).len(), 2);
    }

    #[test]
    fn given_swapped_siblings_when_comparing_then_not_isomorphic() {
        let mut a = WidgetTree::new("w");
        let ra = a.root();
        a.add_text_field(ra, 1).unwrap();
        a.add_text_field(ra, 2).unwrap();

        let mut b = WidgetTree::new("w");
        let rb = b.root();
        b.add_text_field(rb, 2).unwrap();
        b.add_text_field(rb, 1).unwrap();

        assert!(a.is_isomorphic(&a));
        assert!(!a.is_isomorphic(&b));
        assert!(demo_tree().is_isomorphic(&demo_tree()));
    }
}
