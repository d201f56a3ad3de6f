//! Wire grammar shared by encoder and decoder
//!
//! ```text
//! buffer     := record+
//! record     := tag header '/' payload '//'
//! header     := slot                       (positional)
//!             | id [ '^' parent_id ]       (indexed, parent omitted for the root)
//! payload    := string                     (root title)
//!             | '1' | '2'                  (layout: horizontal | vertical)
//!             | decimal                    (text field max length)
//!             | count ( '/' string )*      (choice list, exactly `count` items)
//! string     := ( char - { '/', '\' } | '\/' | '\\' )*
//! ```

use crate::domain::{Alignment, WidgetKind};

pub const SEPARATOR: char = '/';
pub const TERMINATOR: &str = "//";
pub const ESCAPE: char = '\\';
pub const PARENT_MARKER: char = '^';

pub const HORIZONTAL: char = '1';
pub const VERTICAL: char = '2';

/// Single-character kind code at the start of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Root,
    Layout,
    TextField,
    ChoiceList,
}

impl Tag {
    pub fn code(self) -> char {
        match self {
            Tag::Root => '0',
            Tag::Layout => '1',
            Tag::TextField => '2',
            Tag::ChoiceList => '3',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            '0' => Some(Tag::Root),
            '1' => Some(Tag::Layout),
            '2' => Some(Tag::TextField),
            '3' => Some(Tag::ChoiceList),
            _ => None,
        }
    }

    /// Kind name as used in error messages, same as [`WidgetKind::name`].
    pub fn name(self) -> &'static str {
        match self {
            Tag::Root => "Root",
            Tag::Layout => "Layout",
            Tag::TextField => "TextField",
            Tag::ChoiceList => "ChoiceList",
        }
    }

    pub fn of(kind: &WidgetKind) -> Self {
        match kind {
            WidgetKind::Root { .. } => Tag::Root,
            WidgetKind::Layout { .. } => Tag::Layout,
            WidgetKind::TextField { .. } => Tag::TextField,
            WidgetKind::ChoiceList { .. } => Tag::ChoiceList,
        }
    }
}

pub fn alignment_code(alignment: Alignment) -> char {
    match alignment {
        Alignment::Horizontal => HORIZONTAL,
        Alignment::Vertical => VERTICAL,
    }
}

pub fn alignment_from_code(code: char) -> Option<Alignment> {
    match code {
        HORIZONTAL => Some(Alignment::Horizontal),
        VERTICAL => Some(Alignment::Vertical),
        _ => None,
    }
}

/// Appends `value` with separators and escapes guarded.
pub fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        if c == SEPARATOR || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}
