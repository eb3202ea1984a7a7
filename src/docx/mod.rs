//! WordprocessingML (`.docx`) document model.
//!
//! - `xml` - owned XML node tree with quick-xml parsing/writing
//! - `tree` - typed body / paragraph / run / table / row / cell nodes
//! - `format` - cell styling (base font, alignment copy)
//! - `package` - ZIP package load/save

pub mod format;
pub mod package;
pub mod tree;
pub mod xml;

pub use format::BaseFont;
pub use package::{DocxPackage, PackageError, Part, PartKind};
pub use tree::{Block, Body, Cell, Paragraph, Row, Run, Table};
