use crate::element::{Element, ElementData};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    PI(String),
}

impl Node {
    pub fn as_element(&self) -> Option<Element> {
        match self {
            Self::Element(elem) => Some(*elem),
            _ => None,
        }
    }

    pub(crate) fn build_value(&self, document: &Document, buf: &mut String) {
        match self {
            Node::Element(elem) => elem.build_value(document, buf),
            Node::Text(text) | Node::CData(text) => buf.push_str(text),
            Node::Comment(_) | Node::PI(_) => {}
        }
    }

    /// Returns content if node is `Text` or `CData`.
    /// If node is `Element`, return [`Element::value()`]
    pub fn value(&self, document: &Document) -> String {
        let mut buf = String::new();
        self.build_value(document, &mut buf);
        buf
    }
}

/// The `<?xml ...?>` line of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

impl Default for Declaration {
    /// `<?xml version="1.0" encoding="UTF-8" standalone="yes"?>`
    fn default() -> Declaration {
        Declaration {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: Some(true),
        }
    }
}

/// Represents an XML document.
///
/// All elements live in an arena owned by the document and are addressed by
/// [`Element`] handles. Detached elements stay in the arena but are not
/// reachable from [`Document::root_element`] and are never written.
///
/// # Examples
/// ```
/// use xml_records::{Document, Element};
///
/// let mut doc = Document::new();
/// let root = Element::new(&mut doc, "root");
/// doc.set_root_element(root).unwrap();
/// Element::build("record").push_to(&mut doc, root);
/// assert_eq!(doc.root_element(), Some(root));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) store: Vec<ElementData>,
    container: Element,
    declaration: Option<Declaration>,
}

impl Default for Document {
    fn default() -> Document {
        Document::new()
    }
}

impl Document {
    /// Create a blank new xml document without declaration.
    pub fn new() -> Document {
        let (container, container_data) = Element::container();
        Document {
            store: vec![container_data],
            container,
            declaration: None,
        }
    }

    /// The invisible element holding the root element and top level
    /// comments or processing instructions.
    pub fn container(&self) -> Element {
        self.container
    }

    /// Whether no element was ever created in this document.
    pub fn is_empty(&self) -> bool {
        self.store.len() == 1
    }

    /// Get first element of document.
    pub fn root_element(&self) -> Option<Element> {
        self.container
            .children(self)
            .iter()
            .find_map(|node| node.as_element())
    }

    /// Get root nodes of document.
    pub fn root_nodes(&self) -> &Vec<Node> {
        self.container.children(self)
    }

    /// Makes `element` the root element, detaching the previous one.
    ///
    /// # Errors
    ///
    /// - [`Error::HasAParent`]: `element` must be detached.
    /// - [`Error::ContainerCannotMove`]
    pub fn set_root_element(&mut self, element: Element) -> Result<()> {
        if element.is_container() {
            return Err(Error::ContainerCannotMove);
        }
        if element.has_parent(self) {
            return Err(Error::HasAParent);
        }
        if let Some(old) = self.root_element() {
            old.detach(self)?;
        }
        let container = self.container;
        container.push_child(self, Node::Element(element))
    }

    /// Appends a node to the top level.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`]: Pushing a second element, or top level text.
    /// - [`Error::HasAParent`]: The element must be detached.
    pub fn push_root_node(&mut self, node: Node) -> Result<()> {
        match &node {
            Node::Element(_) if self.root_element().is_some() => {
                return Err(Error::invalid_argument(
                    "document already has a root element",
                ))
            }
            Node::Text(_) | Node::CData(_) => {
                return Err(Error::invalid_argument("text is not allowed at top level"))
            }
            _ => {}
        }
        let container = self.container;
        container.push_child(self, node)
    }

    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_ref()
    }

    pub fn set_declaration(&mut self, declaration: Option<Declaration>) {
        self.declaration = declaration;
    }

    /// Sets the default declaration if the document has none,
    /// then returns the declaration.
    pub fn ensure_declaration(&mut self) -> &Declaration {
        self.declaration.get_or_insert_with(Declaration::default)
    }
}
