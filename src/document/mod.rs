/*!
 * Host documents and their text-bearing elements.
 *
 * The walker only talks to a document through the `HostDocument` trait:
 * list the text elements, read one, write one. `dxf` provides the
 * implementation for ASCII DXF drawings.
 */

use std::fmt;

use crate::errors::WriteBackError;
use crate::text::RawText;

pub use self::dxf::DxfDocument;
pub use self::walker::{for_each_text_element, DocumentWalker, TranslationItem};

pub mod dxf;
pub mod walker;

/// Prefix reserved for system-generated block names
pub const RESERVED_BLOCK_PREFIX: char = '*';

/// Kind of a text-bearing element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Single-line text
    Text,
    /// Multi-line text with inline formatting codes
    MText,
    /// Attribute definition (default value)
    AttDef,
    /// Attribute value attached to a block reference
    Attrib,
    /// Dimension text override
    Dimension,
}

impl ElementKind {
    /// Map a DXF entity type name
    pub fn from_entity_type(name: &str) -> Option<Self> {
        match name {
            "TEXT" => Some(Self::Text),
            "MTEXT" => Some(Self::MText),
            "ATTDEF" => Some(Self::AttDef),
            "ATTRIB" => Some(Self::Attrib),
            "DIMENSION" => Some(Self::Dimension),
            _ => None,
        }
    }

    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::MText => "MTEXT",
            Self::AttDef => "ATTDEF",
            Self::Attrib => "ATTRIB",
            Self::Dimension => "DIMENSION",
        }
    }

    /// Whether the text field holds inline formatting codes
    pub fn is_rich(&self) -> bool {
        matches!(self, Self::MText | Self::Dimension)
    }

    /// Whether the element's text is offered for translation
    pub fn is_translatable(&self) -> bool {
        matches!(self, Self::Text | Self::MText)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity_type())
    }
}

/// Where an element lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Container {
    ModelSpace,
    /// Paper space layout
    Layout(String),
    /// Block definition
    Block(String),
}

impl Container {
    /// Top-level containers are model space and the layouts
    pub fn is_top_level(&self) -> bool {
        !matches!(self, Self::Block(_))
    }

    /// Block whose name marks it as system-generated
    pub fn is_anonymous_block(&self) -> bool {
        matches!(self, Self::Block(name) if name.starts_with(RESERVED_BLOCK_PREFIX))
    }

    /// Label used in logs and reports
    pub fn label(&self) -> String {
        match self {
            Self::ModelSpace => "modelspace".to_string(),
            Self::Layout(name) => format!("layout:{}", name),
            Self::Block(name) => format!("block:{}", name),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Handle to an element, valid for the lifetime of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef(pub usize);

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Description of a text-bearing element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInfo {
    pub id: ElementRef,
    pub kind: ElementKind,
    pub container: Container,
    pub layer: String,
}

/// Result of one write-back
#[derive(Debug, Clone, PartialEq)]
pub enum WriteBackStatus {
    /// The element now holds the new value
    Written,
    /// The element already held that value
    Unchanged,
    /// The element refused the value and keeps its original text
    Failed(WriteBackError),
}

impl WriteBackStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Document seen as a list of text-bearing elements
pub trait HostDocument {
    /// Every text-bearing element, in document order
    fn text_elements(&self) -> Vec<ElementInfo>;

    /// Current text of an element, formatting codes included
    fn read_text(&self, element: ElementRef) -> Result<RawText, WriteBackError>;

    /// Replace the text of an element
    fn write_text(&mut self, element: ElementRef, value: &str) -> Result<(), WriteBackError>;

    /// Replace the text unless it already holds `value`
    fn write_back(&mut self, element: ElementRef, value: &str) -> WriteBackStatus {
        match self.read_text(element) {
            Ok(current) if !current.has_lone_surrogates() && current.to_string_lossy() == value => {
                return WriteBackStatus::Unchanged;
            }
            Err(e) => return WriteBackStatus::Failed(e),
            Ok(_) => {}
        }
        match self.write_text(element, value) {
            Ok(()) => WriteBackStatus::Written,
            Err(e) => WriteBackStatus::Failed(e),
        }
    }
}
