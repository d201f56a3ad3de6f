use tracing::{debug, instrument, trace};

use crate::codec::error::{DecodeError, DecodeResult};
use crate::codec::grammar::{self, Tag, ESCAPE, PARENT_MARKER, SEPARATOR, TERMINATOR};
use crate::codec::Format;
use crate::domain::{NodeId, WidgetKind, WidgetTree};

/// Upper bound on decoded nodes unless configured otherwise.
pub const DEFAULT_MAX_NODES: usize = 1 << 20;

/// Parent addressing carried in a record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Slot(usize),
    Indexed { id: usize, parent: Option<usize> },
}

#[derive(Debug)]
struct Header {
    offset: usize,
    tag: Tag,
    link: Link,
}

/// Byte cursor over the buffer. All grammar characters are ASCII, so every
/// position the cursor stops at is a char boundary.
struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn digits(&mut self) -> &'a str {
        let input = self.input;
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        &input[start..self.pos]
    }

    fn truncated(&self, expected: &'static str) -> DecodeError {
        DecodeError::Truncated {
            offset: self.pos,
            expected,
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> DecodeError {
        DecodeError::MalformedHeader {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> DecodeError {
        DecodeError::InvalidPayload {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn header_number(&mut self, what: &'static str) -> DecodeResult<usize> {
        let digits = self.digits();
        if digits.is_empty() {
            return match self.peek() {
                None => Err(self.truncated(what)),
                Some(c) => Err(self.malformed(format!("expected {}, found {:?}", what, c))),
            };
        }
        digits
            .parse()
            .map_err(|_| self.malformed(format!("{} out of range: {}", what, digits)))
    }

    fn header_char(&mut self, expected: char, what: &'static str) -> DecodeResult<()> {
        match self.peek() {
            None => Err(self.truncated(what)),
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.malformed(format!("expected {}, found {:?}", what, c))),
        }
    }

    fn read_header(&mut self, format: Format) -> DecodeResult<Header> {
        let offset = self.pos;
        let code = self.bump().ok_or_else(|| self.truncated("kind tag"))?;
        let tag = Tag::from_code(code).ok_or(DecodeError::UnknownKind { offset, tag: code })?;

        let link = match format {
            Format::Positional => Link::Slot(self.header_number("slot")?),
            Format::Indexed => {
                let id = self.header_number("node id")?;
                let parent = if tag == Tag::Root {
                    None
                } else {
                    self.header_char(PARENT_MARKER, "parent marker")?;
                    Some(self.header_number("parent id")?)
                };
                Link::Indexed { id, parent }
            }
        };
        self.header_char(SEPARATOR, "field separator")?;

        Ok(Header { offset, tag, link })
    }

    /// Reads an escaped string up to, not including, the next bare separator.
    fn escaped(&mut self) -> DecodeResult<String> {
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.truncated("field separator")),
                Some(SEPARATOR) => return Ok(value),
                Some(ESCAPE) => {
                    self.pos += 1;
                    match self.bump() {
                        None => return Err(self.truncated("escaped character")),
                        Some(c @ (SEPARATOR | ESCAPE)) => value.push(c),
                        Some(c) => {
                            return Err(self.invalid(format!("invalid escape sequence \\{}", c)))
                        }
                    }
                }
                Some(c) => {
                    self.pos += c.len_utf8();
                    value.push(c);
                }
            }
        }
    }

    fn payload_number(&mut self, what: &'static str) -> DecodeResult<&'a str> {
        let digits = self.digits();
        if digits.is_empty() {
            return match self.peek() {
                None => Err(self.truncated(what)),
                Some(c) => Err(self.invalid(format!("expected {}, found {:?}", what, c))),
            };
        }
        Ok(digits)
    }

    /// Payload of the root record.
    fn read_title(&mut self) -> DecodeResult<String> {
        let title = self.escaped()?;
        self.expect_terminator()?;
        Ok(title)
    }

    fn read_payload(&mut self, tag: Tag) -> DecodeResult<WidgetKind> {
        let kind = match tag {
            Tag::Root => {
                return Ok(WidgetKind::Root {
                    title: self.read_title()?,
                })
            }
            Tag::Layout => {
                let code = self.bump().ok_or_else(|| self.truncated("alignment"))?;
                let alignment = grammar::alignment_from_code(code)
                    .ok_or_else(|| self.invalid(format!("unknown alignment {:?}", code)))?;
                WidgetKind::Layout { alignment }
            }
            Tag::TextField => {
                let digits = self.payload_number("max length")?;
                let max_length = digits
                    .parse()
                    .map_err(|_| self.invalid(format!("max length out of range: {}", digits)))?;
                WidgetKind::TextField { max_length }
            }
            Tag::ChoiceList => {
                let digits = self.payload_number("item count")?;
                let count: usize = digits
                    .parse()
                    .map_err(|_| self.invalid(format!("item count out of range: {}", digits)))?;
                let mut items = Vec::new();
                for _ in 0..count {
                    match self.bump() {
                        None => return Err(self.truncated("item separator")),
                        Some(SEPARATOR) => items.push(self.escaped()?),
                        Some(c) => {
                            return Err(self.invalid(format!("expected item separator, found {:?}", c)))
                        }
                    }
                }
                WidgetKind::ChoiceList { items }
            }
        };
        self.expect_terminator()?;
        Ok(kind)
    }

    fn expect_terminator(&mut self) -> DecodeResult<()> {
        let rest = &self.input[self.pos..];
        if rest.starts_with(TERMINATOR) {
            self.pos += TERMINATOR.len();
            Ok(())
        } else if TERMINATOR.starts_with(rest) {
            Err(self.truncated("terminator"))
        } else {
            Err(self.invalid("expected terminator"))
        }
    }
}

/// Maps header links onto already decoded nodes.
enum ParentIndex {
    /// Root-to-current path with each node's own slot; slots strictly
    /// increase along the path, so a slot names at most one entry.
    Positional { path: Vec<(NodeId, usize)> },
    /// Decoded nodes in pre-order; position equals node id.
    Indexed { decoded: Vec<NodeId> },
}

impl ParentIndex {
    fn new(format: Format) -> Self {
        match format {
            Format::Positional => ParentIndex::Positional { path: Vec::new() },
            Format::Indexed => ParentIndex::Indexed {
                decoded: Vec::new(),
            },
        }
    }

    fn register_root(&mut self, root: NodeId, header: &Header) -> DecodeResult<()> {
        match (self, header.link) {
            (ParentIndex::Positional { path }, Link::Slot(slot)) => {
                path.push((root, slot));
                Ok(())
            }
            (ParentIndex::Indexed { decoded }, Link::Indexed { id: 0, parent: None }) => {
                decoded.push(root);
                Ok(())
            }
            (_, link) => Err(DecodeError::MalformedHeader {
                offset: header.offset,
                reason: format!("invalid root header {:?}", link),
            }),
        }
    }

    fn resolve(&mut self, header: &Header) -> DecodeResult<NodeId> {
        match (self, header.link) {
            (ParentIndex::Positional { path }, Link::Slot(slot)) => {
                while matches!(path.last(), Some(&(_, own)) if own > slot) {
                    path.pop();
                }
                match path.last() {
                    Some(&(node, own)) if own == slot => Ok(node),
                    _ => Err(DecodeError::UnresolvableReference {
                        offset: header.offset,
                        reference: slot,
                    }),
                }
            }
            (
                ParentIndex::Indexed { decoded },
                Link::Indexed {
                    id,
                    parent: Some(parent),
                },
            ) => {
                if id != decoded.len() {
                    return Err(DecodeError::MalformedHeader {
                        offset: header.offset,
                        reason: format!("node id {} out of sequence, expected {}", id, decoded.len()),
                    });
                }
                decoded
                    .get(parent)
                    .copied()
                    .ok_or(DecodeError::UnresolvableReference {
                        offset: header.offset,
                        reference: parent,
                    })
            }
            (_, link) => Err(DecodeError::MalformedHeader {
                offset: header.offset,
                reason: format!("invalid header {:?}", link),
            }),
        }
    }

    fn record(&mut self, tree: &WidgetTree, node: NodeId, parent: NodeId, header: &Header) {
        match (self, header.link) {
            (ParentIndex::Positional { path }, Link::Slot(slot)) => {
                // Just appended, so its rank is the last position
                let rank = tree.children(parent).len().saturating_sub(1);
                path.push((node, slot.saturating_add(1).saturating_add(rank)));
            }
            (ParentIndex::Indexed { decoded }, _) => decoded.push(node),
            (ParentIndex::Positional { .. }, _) => {}
        }
    }
}

/// Rebuilds a [`WidgetTree`] from a buffer in one left-to-right pass.
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    format: Format,
    max_nodes: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(Format::default())
    }
}

impl Decoder {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    #[instrument(level = "debug", skip(self, buffer), fields(format = %self.format, len = buffer.len()))]
    pub fn decode(&self, buffer: &str) -> DecodeResult<WidgetTree> {
        if buffer.is_empty() {
            return Err(DecodeError::Empty);
        }
        let mut reader = Reader::new(buffer);
        let mut parents = ParentIndex::new(self.format);

        let header = reader.read_header(self.format)?;
        if header.tag != Tag::Root {
            return Err(DecodeError::MissingRoot {
                found: header.tag.name(),
            });
        }
        let title = reader.read_title()?;
        let mut tree = WidgetTree::new(title);
        parents.register_root(tree.root(), &header)?;

        while !reader.is_at_end() {
            let header = reader.read_header(self.format)?;
            if header.tag == Tag::Root {
                return Err(DecodeError::UnexpectedRoot {
                    offset: header.offset,
                });
            }
            let kind = reader.read_payload(header.tag)?;
            if tree.len() >= self.max_nodes {
                return Err(DecodeError::TooManyNodes {
                    limit: self.max_nodes,
                });
            }

            let parent = parents.resolve(&header)?;
            let node = tree
                .insert(parent, kind)
                .map_err(|_| DecodeError::UnresolvableReference {
                    offset: header.offset,
                    reference: match header.link {
                        Link::Slot(slot) => slot,
                        Link::Indexed { parent, .. } => parent.unwrap_or_default(),
                    },
                })?;
            parents.record(&tree, node, parent, &header);
            trace!(offset = header.offset, link = ?header.link, "record decoded");
        }

        debug!("decoded {} nodes", tree.len());
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::error::DecodeErrorKind;
    use crate::codec::Encoder;
    use crate::domain::{demo_tree, Alignment};
    use rstest::rstest;

    #[rstest]
    #[case(Format::Positional)]
    #[case(Format::Indexed)]
    fn given_demo_buffer_when_decoding_then_same_tree(#[case] format: Format) {
        let buffer = Encoder::new(format).encode(&demo_tree());
        let decoded = Decoder::new(format).decode(&buffer).unwrap();
        assert!(decoded.is_isomorphic(&demo_tree()));
    }

    #[test]
    fn given_positional_buffer_when_decoding_then_grandchildren_under_right_layout() {
        let buffer = "00/Application//10/1//21/20//21/30//10/2//32/4/1/2/3/4//32/3/a/b/c//";
        let tree = Decoder::new(Format::Positional).decode(buffer).unwrap();
        let layouts = tree.children(tree.root()).to_vec();
        assert_eq!(layouts.len(), 2);
        assert_eq!(
            tree.kind(layouts[0]),
            Some(&WidgetKind::Layout {
                alignment: Alignment::Horizontal
            })
        );
        let fields: Vec<_> = tree
            .children(layouts[0])
            .iter()
            .filter_map(|&c| tree.kind(c).cloned())
            .collect();
        assert_eq!(
            fields,
            vec![
                WidgetKind::TextField { max_length: 20 },
                WidgetKind::TextField { max_length: 30 }
            ]
        );
        assert_eq!(tree.children(layouts[1]).len(), 2);
    }

    #[test]
    fn given_only_root_when_decoding_then_single_node() {
        let tree = Decoder::default().decode("00/solo//").unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.kind(tree.root()),
            Some(&WidgetKind::Root {
                title: "solo".into()
            })
        );
    }

    #[rstest]
    #[case("", DecodeErrorKind::Truncated)]
    #[case("9", DecodeErrorKind::MalformedHeader)]
    #[case("10/1//", DecodeErrorKind::MalformedHeader)]
    #[case("00/w//00/x//", DecodeErrorKind::MalformedHeader)]
    #[case("00/w//x0/1//", DecodeErrorKind::MalformedHeader)]
    #[case("00/w", DecodeErrorKind::Truncated)]
    #[case("00/w/", DecodeErrorKind::Truncated)]
    #[case("00/w//10/", DecodeErrorKind::Truncated)]
    #[case("00/w//30/1/a/b//", DecodeErrorKind::Payload)]
    #[case("00/w//10/7//", DecodeErrorKind::Payload)]
    #[case("00/w//20/x//", DecodeErrorKind::Payload)]
    #[case("00/w//21/5//", DecodeErrorKind::UnresolvableReference)]
    #[case("00/w//10/1//22/3//", DecodeErrorKind::UnresolvableReference)]
    fn given_bad_positional_buffer_when_decoding_then_error_kind(
        #[case] buffer: &str,
        #[case] expected: DecodeErrorKind,
    ) {
        let err = Decoder::new(Format::Positional).decode(buffer).unwrap_err();
        assert_eq!(err.kind(), expected, "{:?}", err);
    }

    #[rstest]
    #[case("00/w//11^7/1//", DecodeErrorKind::UnresolvableReference)]
    #[case("00/w//12^0/1//", DecodeErrorKind::MalformedHeader)]
    #[case("00/w//11/1//", DecodeErrorKind::MalformedHeader)]
    #[case("01/w//", DecodeErrorKind::MalformedHeader)]
    #[case("00^0/w//", DecodeErrorKind::MalformedHeader)]
    #[case("00/w//11^", DecodeErrorKind::Truncated)]
    fn given_bad_indexed_buffer_when_decoding_then_error_kind(
        #[case] buffer: &str,
        #[case] expected: DecodeErrorKind,
    ) {
        let err = Decoder::new(Format::Indexed).decode(buffer).unwrap_err();
        assert_eq!(err.kind(), expected, "{:?}", err);
    }

    #[test]
    fn given_node_limit_when_exceeded_then_too_many_nodes() {
        let buffer = Encoder::new(Format::Indexed).encode(&demo_tree());
        let err = Decoder::new(Format::Indexed)
            .with_max_nodes(3)
            .decode(&buffer)
            .unwrap_err();
        assert_eq!(err, DecodeError::TooManyNodes { limit: 3 });
    }

    #[test]
    fn given_escaped_title_when_decoding_then_root_title_restored() {
        let tree = Decoder::default().decode(r"00/a\/b\\c//").unwrap();
        assert_eq!(
            tree.kind(tree.root()),
            Some(&WidgetKind::Root {
                title: r"a/b\c".into()
            })
        );
    }

    #[test]
    fn given_layout_first_when_decoding_then_missing_root_names_kind() {
        let err = Decoder::new(Format::Positional).decode("10/1//").unwrap_err();
        assert_eq!(err, DecodeError::MissingRoot { found: "Layout" });
    }

    #[test]
    fn given_invalid_escape_when_decoding_then_payload_error() {
        let err = Decoder::default().decode(r"00/a\b//").unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Payload);
    }
}
