use crate::document::{Document, Node};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// A `name="value"` pair attached to an element.
///
/// Attribute names are not required to be unique on an element;
/// [`Element::set_attribute`] updates the first match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Attribute {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    full_name: String,
    attributes: Vec<Attribute>,                // q:attr="val" => ("q:attr", "val")
    namespace_decls: BTreeMap<String, String>, // local namespace newly defined in attributes
    parent: Option<Element>,
    children: Vec<Node>,
}

/// Represents an XML element.
///
/// This struct only contains a unique usize id and implements trait `Copy`.
/// So you do not need to bother with having a reference.
///
/// Because the actual data of the element is stored in [`Document`],
/// most methods takes `&Document` or `&mut Document` as its first argument.
///
/// Passing an element to a document it was not created in is a logic error
/// and may panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element {
    id: usize,
}

impl Element {
    /// Create a new detached element with name.
    ///
    /// Use [`Element::build`] if you need to check the name or want to
    /// attach attributes and text in one go.
    pub fn new<S: Into<String>>(document: &mut Document, name: S) -> Element {
        Self::with_data(document, name.into(), Vec::new(), BTreeMap::new())
    }

    /// Start building an element. See [`ElementBuilder`].
    pub fn build<S: Into<String>>(name: S) -> ElementBuilder {
        ElementBuilder::new(name)
    }

    pub(crate) fn with_data(
        document: &mut Document,
        full_name: String,
        attributes: Vec<Attribute>,
        namespace_decls: BTreeMap<String, String>,
    ) -> Element {
        let elem = Element {
            id: document.store.len(),
        };
        document.store.push(ElementData {
            full_name,
            attributes,
            namespace_decls,
            parent: None,
            children: Vec::new(),
        });
        elem
    }

    pub(crate) fn container() -> (Element, ElementData) {
        let elem_data = ElementData {
            full_name: String::new(),
            attributes: Vec::new(),
            namespace_decls: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        };
        (Element { id: 0 }, elem_data)
    }

    /// The container is the invisible parent of the root element.
    pub fn is_container(&self) -> bool {
        self.id == 0
    }

    pub fn separate_prefix_name(full_name: &str) -> (&str, &str) {
        match full_name.split_once(':') {
            Some((prefix, name)) => (prefix, name),
            None => ("", full_name),
        }
    }
}

impl Element {
    fn data<'a>(&self, document: &'a Document) -> &'a ElementData {
        &document.store[self.id]
    }

    fn mut_data<'a>(&self, document: &'a mut Document) -> &'a mut ElementData {
        &mut document.store[self.id]
    }

    /// Get raw name of element, including its namespace prefix.
    pub fn full_name<'a>(&self, document: &'a Document) -> &'a str {
        &self.data(document).full_name
    }

    /// Get prefix and name of element.
    ///
    /// `<prefix:name>` -> `("prefix", "name")`
    pub fn prefix_name<'a>(&self, document: &'a Document) -> (&'a str, &'a str) {
        Self::separate_prefix_name(self.full_name(document))
    }

    /// Get namespace prefix of element, without name.
    ///
    /// `<prefix:name>` -> `"prefix"`.
    pub fn prefix<'a>(&self, document: &'a Document) -> &'a str {
        self.prefix_name(document).0
    }

    /// Get local name of element, without prefix.
    pub fn name<'a>(&self, document: &'a Document) -> &'a str {
        self.prefix_name(document).1
    }

    /// Rename the element. The name may include a prefix.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`]: `name` is empty.
    /// - [`Error::ContainerCannotMove`]: The container has no name.
    pub fn set_name<S: Into<String>>(&self, document: &mut Document, name: S) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_argument("element name is empty"));
        }
        if self.is_container() {
            return Err(Error::ContainerCannotMove);
        }
        self.mut_data(document).full_name = name;
        Ok(())
    }

    /// Get attributes of element in document order.
    ///
    /// The attribute names may have namespace prefix. To strip the prefix and only its name, call [`Element::separate_prefix_name`].
    pub fn attributes<'a>(&self, document: &'a Document) -> &'a [Attribute] {
        &self.data(document).attributes
    }

    pub(crate) fn mut_attributes<'a>(&self, document: &'a mut Document) -> &'a mut Vec<Attribute> {
        &mut self.mut_data(document).attributes
    }

    pub fn has_attributes(&self, document: &Document) -> bool {
        !self.attributes(document).is_empty()
    }

    /// Value of the first attribute named `name`.
    pub fn attribute<'a>(&self, document: &'a Document, name: &str) -> Option<&'a str> {
        self.attributes(document)
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Sets the first attribute named `name`, or appends a new one.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`]: `name` is empty.
    pub fn set_attribute<N, V>(&self, document: &mut Document, name: N, value: V) -> Result<()>
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_argument("attribute name is empty"));
        }
        let value = value.into();
        let attributes = self.mut_attributes(document);
        match attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => attributes.push(Attribute { name, value }),
        }
        Ok(())
    }

    /// Removes every attribute named `name`. Returns how many were removed.
    pub fn remove_attribute(&self, document: &mut Document, name: &str) -> usize {
        let attributes = self.mut_attributes(document);
        let before = attributes.len();
        attributes.retain(|attr| attr.name != name);
        before - attributes.len()
    }

    /// Gets the namespace of this element.
    ///
    /// Shorthand for `self.namespace_for_prefix(document, self.prefix(document))`.
    pub fn namespace<'a>(&self, document: &'a Document) -> Option<&'a str> {
        self.namespace_for_prefix(document, self.prefix(document))
    }

    /// Gets `prefix -> namespace` pairs declared on this element.
    pub fn namespace_decls<'a>(&self, document: &'a Document) -> &'a BTreeMap<String, String> {
        &self.data(document).namespace_decls
    }

    pub fn mut_namespace_decls<'a>(
        &self,
        document: &'a mut Document,
    ) -> &'a mut BTreeMap<String, String> {
        &mut self.mut_data(document).namespace_decls
    }

    /// Get namespace value given prefix, for this element.
    /// Looks up the declarations on this element and then on its ancestors.
    pub fn namespace_for_prefix<'a>(
        &self,
        document: &'a Document,
        prefix: &str,
    ) -> Option<&'a str> {
        let mut elem = *self;
        loop {
            let data = elem.data(document);
            if let Some(value) = data.namespace_decls.get(prefix) {
                return Some(value);
            }
            elem = elem.parent(document)?;
        }
    }

    pub fn parent(&self, document: &Document) -> Option<Element> {
        self.data(document).parent
    }

    /// ```ignore
    /// self.parent(document).is_some()
    /// ```
    pub fn has_parent(&self, document: &Document) -> bool {
        self.parent(document).is_some()
    }

    pub fn children<'a>(&self, document: &'a Document) -> &'a Vec<Node> {
        &self.data(document).children
    }

    /// ```ignore
    /// !self.children(document).is_empty()
    /// ```
    pub fn has_children(&self, document: &Document) -> bool {
        !self.children(document).is_empty()
    }

    pub fn child_elements(&self, document: &Document) -> Vec<Element> {
        self.children(document)
            .iter()
            .filter_map(|node| node.as_element())
            .collect()
    }

    pub fn has_child_elements(&self, document: &Document) -> bool {
        self.children(document)
            .iter()
            .any(|node| node.as_element().is_some())
    }

    /// An element without child elements. Its content, if any, is text.
    pub fn is_leaf(&self, document: &Document) -> bool {
        !self.has_child_elements(document)
    }

    fn _child_elements_recursive(&self, document: &Document, elements: &mut Vec<Element>) {
        for node in self.children(document) {
            if let Node::Element(elem) = node {
                elements.push(*elem);
                elem._child_elements_recursive(document, elements);
            }
        }
    }

    /// All descendant elements in document order. `self` is not included.
    pub fn child_elements_recursive(&self, document: &Document) -> Vec<Element> {
        let mut elements = Vec::new();
        self._child_elements_recursive(document, &mut elements);
        elements
    }

    /// First child element with the full name `name`.
    pub fn find(&self, document: &Document, name: &str) -> Option<Element> {
        self.children(document)
            .iter()
            .filter_map(|node| node.as_element())
            .find(|elem| elem.full_name(document) == name)
    }

    /// Child elements with the full name `name`.
    pub fn find_all(&self, document: &Document, name: &str) -> Vec<Element> {
        self.children(document)
            .iter()
            .filter_map(|node| node.as_element())
            .filter(|elem| elem.full_name(document) == name)
            .collect()
    }

    /// Descendant elements with the full name `name`, in document order.
    pub fn descendants_named(&self, document: &Document, name: &str) -> Vec<Element> {
        self.child_elements_recursive(document)
            .into_iter()
            .filter(|elem| elem.full_name(document) == name)
            .collect()
    }

    /// Concatenated text and CDATA content of all descendants.
    pub fn value(&self, document: &Document) -> String {
        let mut buf = String::new();
        self.build_value(document, &mut buf);
        buf
    }

    pub(crate) fn build_value(&self, document: &Document, buf: &mut String) {
        for child in self.children(document) {
            child.build_value(document, buf);
        }
    }

    /// Replaces all children with a single text node.
    ///
    /// Child elements are detached. An empty `text` still leaves an empty
    /// text node, which is written as `<name></name>`.
    pub fn set_value<S: Into<String>>(&self, document: &mut Document, text: S) {
        let old = std::mem::take(&mut self.mut_data(document).children);
        for node in old {
            if let Node::Element(elem) = node {
                elem.mut_data(document).parent = None;
            }
        }
        self.mut_data(document).children.push(Node::Text(text.into()));
    }

    fn check_adoptable(&self, document: &Document, node: &Node) -> Result<()> {
        if let Node::Element(elem) = node {
            if elem.is_container() {
                return Err(Error::ContainerCannotMove);
            }
            if elem.has_parent(document) {
                return Err(Error::HasAParent);
            }
        }
        Ok(())
    }

    // Caller guarantees the node is adoptable.
    pub(crate) fn attach(&self, document: &mut Document, node: Node) {
        if let Node::Element(elem) = node {
            elem.mut_data(document).parent = Some(*self);
        }
        self.mut_data(document).children.push(node);
    }

    /// Equivalent to `vec.push()`.
    ///
    /// # Errors
    ///
    /// - [`Error::HasAParent`]: If node is an element, it must not have a parent.
    /// Call `elem.detach()` before.
    /// - [`Error::ContainerCannotMove`]: The container cannot be a child.
    pub fn push_child(&self, document: &mut Document, node: Node) -> Result<()> {
        self.check_adoptable(document, &node)?;
        self.attach(document, node);
        Ok(())
    }

    /// Equivalent to `vec.insert()`.
    ///
    /// # Errors
    ///
    /// - [`Error::HasAParent`]: If node is an element, it must not have a parent.
    /// Call `elem.detach()` before.
    /// - [`Error::ContainerCannotMove`]: The container cannot be a child.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_child(&self, document: &mut Document, index: usize, node: Node) -> Result<()> {
        self.check_adoptable(document, &node)?;
        if let Node::Element(elem) = node {
            elem.mut_data(document).parent = Some(*self);
        }
        self.mut_data(document).children.insert(index, node);
        Ok(())
    }

    /// Inserts nodes right after this element, in the given order.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`]: This element has no parent.
    /// - [`Error::HasAParent`]: A node to insert is an element with a parent.
    pub fn insert_after(&self, document: &mut Document, nodes: Vec<Node>) -> Result<()> {
        let parent = self.parent(document).ok_or(Error::NotFound)?;
        for node in &nodes {
            self.check_adoptable(document, node)?;
        }
        let mut index = parent.child_index(document, *self).ok_or(Error::NotFound)? + 1;
        for node in nodes {
            parent.insert_child(document, index, node)?;
            index += 1;
        }
        Ok(())
    }

    pub(crate) fn child_index(&self, document: &Document, element: Element) -> Option<usize> {
        self.children(document)
            .iter()
            .position(|node| node.as_element() == Some(element))
    }

    pub(crate) fn set_children(&self, document: &mut Document, children: Vec<Node>) {
        self.mut_data(document).children = children;
    }

    /// Equivalent to `vec.remove()`. A removed element becomes detached.
    ///
    /// # Panics
    ///
    /// Panics if index is out of bounds.
    pub fn remove_child(&self, document: &mut Document, index: usize) -> Node {
        let node = self.mut_data(document).children.remove(index);
        if let Node::Element(elem) = node {
            elem.mut_data(document).parent = None;
        }
        node
    }

    /// Remove child element by value.
    ///
    /// # Errors
    ///
    /// - [Error::NotFound]: Element was not found among its children.
    pub fn remove_child_elem(&self, document: &mut Document, element: Element) -> Result<()> {
        let pos = self
            .child_index(document, element)
            .ok_or(Error::NotFound)?;
        self.remove_child(document, pos);
        Ok(())
    }

    /// Remove element from its parent. Does nothing if it has no parent.
    ///
    /// # Errors
    ///
    /// - [`Error::ContainerCannotMove`]: The container cannot be detached.
    pub fn detach(&self, document: &mut Document) -> Result<()> {
        if self.is_container() {
            return Err(Error::ContainerCannotMove);
        }
        match self.parent(document) {
            Some(parent) => parent.remove_child_elem(document, *self),
            None => Ok(()),
        }
    }

    /// Returns a detached deep copy of this element: name, attributes,
    /// namespace declarations and all descendant nodes.
    pub fn deep_copy(&self, document: &mut Document) -> Element {
        let data = self.data(document);
        let full_name = data.full_name.clone();
        let attributes = data.attributes.clone();
        let namespace_decls = data.namespace_decls.clone();
        let children = data.children.clone();
        let copy = Element::with_data(document, full_name, attributes, namespace_decls);
        for node in children {
            let node = match node {
                Node::Element(elem) => Node::Element(elem.deep_copy(document)),
                other => other,
            };
            copy.attach(document, node);
        }
        copy
    }

    /// Structural equality: same names, attributes, namespace declarations
    /// and children, recursively. Element identity is ignored.
    pub fn deep_eq(&self, document: &Document, other: Element) -> bool {
        let (a, b) = (self.data(document), other.data(document));
        if a.full_name != b.full_name
            || a.attributes != b.attributes
            || a.namespace_decls != b.namespace_decls
            || a.children.len() != b.children.len()
        {
            return false;
        }
        a.children
            .iter()
            .zip(b.children.iter())
            .all(|pair| match pair {
                (Node::Element(x), Node::Element(y)) => x.deep_eq(document, *y),
                (Node::Element(_), _) | (_, Node::Element(_)) => false,
                (x, y) => x == y,
            })
    }
}

/// Builder for an element with attributes and text.
///
/// ```
/// use xml_records::{Document, Element};
///
/// let mut doc = Document::new();
/// let container = doc.container();
/// let root = Element::build("root").push_to(&mut doc, container);
/// let a = Element::build("A")
///     .attribute("type", "String")
///     .text_content("a")
///     .push_to(&mut doc, root);
/// assert_eq!(a.value(&doc), "a");
/// assert_eq!(a.attribute(&doc, "type"), Some("String"));
/// ```
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    full_name: String,
    attributes: Vec<Attribute>,
    namespace_decls: BTreeMap<String, String>,
    content: Option<String>,
}

impl ElementBuilder {
    fn new<S: Into<String>>(name: S) -> ElementBuilder {
        ElementBuilder {
            full_name: name.into(),
            attributes: Vec::new(),
            namespace_decls: BTreeMap::new(),
            content: None,
        }
    }

    pub fn attribute<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn namespace_decl<P: Into<String>, V: Into<String>>(mut self, prefix: P, value: V) -> Self {
        self.namespace_decls.insert(prefix.into(), value.into());
        self
    }

    pub fn text_content<S: Into<String>>(mut self, text: S) -> Self {
        self.content = Some(text.into());
        self
    }

    /// Creates the detached element.
    pub fn finish(self, document: &mut Document) -> Element {
        let elem = Element::with_data(
            document,
            self.full_name,
            self.attributes,
            self.namespace_decls,
        );
        if let Some(text) = self.content {
            elem.attach(document, Node::Text(text));
        }
        elem
    }

    /// Creates the element and appends it to `parent`.
    pub fn push_to(self, document: &mut Document, parent: Element) -> Element {
        let elem = self.finish(document);
        parent.attach(document, Node::Element(elem));
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, Element) {
        let mut doc = Document::new();
        let container = doc.container();
        let root = Element::build("root")
            .namespace_decl("p", "urn:p")
            .push_to(&mut doc, container);
        let record = Element::build("record")
            .attribute("id", "1")
            .push_to(&mut doc, root);
        Element::build("A").text_content("a").push_to(&mut doc, record);
        Element::build("p:B").text_content("b").push_to(&mut doc, record);
        (doc, root)
    }

    #[test]
    fn test_children() {
        let (doc, root) = sample();
        let record = root.child_elements(&doc)[0];
        let a = record.find(&doc, "A").unwrap();
        let b = record.find(&doc, "p:B").unwrap();
        assert_eq!(root.child_elements_recursive(&doc), vec![record, a, b]);
        assert_eq!(b.prefix_name(&doc), ("p", "B"));
        assert_eq!(b.namespace(&doc), Some("urn:p"));
        assert_eq!(a.namespace(&doc), None);
        assert_eq!(record.value(&doc), "ab");
        assert!(a.is_leaf(&doc));
        assert!(!record.is_leaf(&doc));
        assert_eq!(root.descendants_named(&doc, "A"), vec![a]);
    }

    #[test]
    fn test_set_value_detaches_elements() {
        let (mut doc, root) = sample();
        let record = root.child_elements(&doc)[0];
        let a = record.find(&doc, "A").unwrap();
        record.set_value(&mut doc, "flat");
        assert_eq!(record.value(&doc), "flat");
        assert!(record.is_leaf(&doc));
        assert!(!a.has_parent(&doc));
    }

    #[test]
    fn test_attributes() {
        let (mut doc, root) = sample();
        let record = root.child_elements(&doc)[0];
        record.set_attribute(&mut doc, "id", "2").unwrap();
        record.set_attribute(&mut doc, "kind", "x").unwrap();
        assert_eq!(record.attribute(&doc, "id"), Some("2"));
        assert_eq!(record.attributes(&doc).len(), 2);
        assert_eq!(record.remove_attribute(&mut doc, "id"), 1);
        assert_eq!(record.attribute(&doc, "id"), None);
        assert!(matches!(
            record.set_attribute(&mut doc, "", "x"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_deep_copy() {
        let (mut doc, root) = sample();
        let copy = root.deep_copy(&mut doc);
        assert_ne!(copy, root);
        assert!(!copy.has_parent(&doc));
        assert!(copy.deep_eq(&doc, root));

        let copied_a = copy.child_elements(&doc)[0].find(&doc, "A").unwrap();
        copied_a.set_value(&mut doc, "changed");
        assert!(!copy.deep_eq(&doc, root));
        let a = root.child_elements(&doc)[0].find(&doc, "A").unwrap();
        assert_eq!(a.value(&doc), "a");
    }

    #[test]
    fn test_push_and_detach() {
        let (mut doc, root) = sample();
        let record = root.child_elements(&doc)[0];
        let extra = Element::new(&mut doc, "extra");
        record.push_child(&mut doc, Node::Element(extra)).unwrap();
        assert_eq!(extra.parent(&doc), Some(record));
        assert!(matches!(
            root.push_child(&mut doc, Node::Element(extra)),
            Err(Error::HasAParent)
        ));
        extra.detach(&mut doc).unwrap();
        assert!(record.find(&doc, "extra").is_none());
        assert!(matches!(
            doc.container().detach(&mut doc),
            Err(Error::ContainerCannotMove)
        ));
    }

    #[test]
    fn test_insert_after() {
        let (mut doc, root) = sample();
        let record = root.child_elements(&doc)[0];
        let a = record.find(&doc, "A").unwrap();
        let mid = Element::new(&mut doc, "mid");
        a.insert_after(&mut doc, vec![Node::Element(mid), Node::Text("t".into())])
            .unwrap();
        let names: Vec<&str> = record
            .child_elements(&doc)
            .iter()
            .map(|e| e.full_name(&doc))
            .collect();
        assert_eq!(names, vec!["A", "mid", "p:B"]);
        assert_eq!(record.children(&doc).len(), 4);
        let orphan = Element::new(&mut doc, "orphan");
        assert!(matches!(
            orphan.insert_after(&mut doc, vec![]),
            Err(Error::NotFound)
        ));
    }
}
