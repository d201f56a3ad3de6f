use tracing::{instrument, trace};

use crate::codec::grammar::{self, Tag, PARENT_MARKER, SEPARATOR, TERMINATOR};
use crate::codec::Format;
use crate::domain::{NodeId, WidgetKind, WidgetTree};

/// Pending record: node plus what its header needs.
struct Pending {
    node: NodeId,
    inherited_slot: usize,
    sibling_index: usize,
    parent_id: Option<usize>,
}

/// Flattens a [`WidgetTree`] into a buffer in depth-first pre-order.
///
/// Encoding is infallible and deterministic: the same tree always yields the
/// same buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    format: Format,
}

impl Encoder {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    #[instrument(level = "debug", skip(self, tree), fields(format = %self.format, nodes = tree.len()))]
    pub fn encode(&self, tree: &WidgetTree) -> String {
        let mut out = String::new();
        let mut next_id = 0;
        let mut stack = vec![Pending {
            node: tree.root(),
            inherited_slot: 0,
            sibling_index: 0,
            parent_id: None,
        }];

        while let Some(pending) = stack.pop() {
            let Some(node) = tree.get(pending.node) else {
                continue;
            };
            let id = next_id;
            next_id += 1;

            self.write_header(&mut out, &node.kind, &pending, id);
            write_payload(&mut out, &node.kind);
            out.push_str(TERMINATOR);

            let own_slot = if node.kind.is_root() {
                pending.inherited_slot
            } else {
                pending.inherited_slot + 1 + pending.sibling_index
            };
            trace!(id, own_slot, kind = node.kind.name(), "record written");

            // Reverse push keeps siblings in attachment order
            for (rank, &child) in node.children.iter().enumerate().rev() {
                stack.push(Pending {
                    node: child,
                    inherited_slot: own_slot,
                    sibling_index: rank,
                    parent_id: Some(id),
                });
            }
        }

        out
    }

    fn write_header(&self, out: &mut String, kind: &WidgetKind, pending: &Pending, id: usize) {
        out.push(Tag::of(kind).code());
        match self.format {
            Format::Positional => out.push_str(&pending.inherited_slot.to_string()),
            Format::Indexed => {
                out.push_str(&id.to_string());
                if let Some(parent_id) = pending.parent_id {
                    out.push(PARENT_MARKER);
                    out.push_str(&parent_id.to_string());
                }
            }
        }
        out.push(SEPARATOR);
    }
}

fn write_payload(out: &mut String, kind: &WidgetKind) {
    match kind {
        WidgetKind::Root { title } => grammar::push_escaped(out, title),
        WidgetKind::Layout { alignment } => out.push(grammar::alignment_code(*alignment)),
        WidgetKind::TextField { max_length } => out.push_str(&max_length.to_string()),
        WidgetKind::ChoiceList { items } => {
            out.push_str(&items.len().to_string());
            for item in items {
                out.push(SEPARATOR);
                grammar::push_escaped(out, item);
            }
        }
    }
}
