//! Domain layer: the widget tree model
//!
//! This layer is independent of the wire format, configuration and CLI.

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;

pub use arena::{demo_tree, NodeId, PreOrderIter, WidgetNode, WidgetTree};
pub use builder::{describe, describe_toml, TreeBuilder, WidgetDescription, WindowDescription};
pub use entities::{Alignment, WidgetKind};
pub use error::{DomainError, DomainResult};
