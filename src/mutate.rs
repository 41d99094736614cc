//! Batched find-and-mutate operations.
//!
//! Every mutator changes the tree in place and has a `with_*` twin that
//! works on a deep copy and returns it, leaving the original untouched:
//!
//! ```
//! use xml_records::{Document, Element, Filter};
//!
//! let mut doc = Document::new();
//! let record = Element::new(&mut doc, "record");
//! Element::build("A").text_content("a").push_to(&mut doc, record);
//! Element::build("B").text_content("b").push_to(&mut doc, record);
//!
//! let copy = record.with_remove_by(&mut doc, Filter::Name("A")).unwrap();
//! assert_eq!(copy.child_elements(&doc).len(), 1);
//! assert_eq!(record.child_elements(&doc).len(), 2);
//! ```
//!
//! Names are full names, prefix included. An empty name fails with
//! [`Error::InvalidArgument`] before anything is changed. Matching nothing
//! is not an error.

use crate::document::{Document, Node};
use crate::element::Element;
use crate::error::{Error, Result};
use std::fmt;

/// Predicate over an element of a document.
pub type Predicate<'a> = &'a dyn Fn(&Document, Element) -> bool;

/// Selects elements by name, by predicate, or by both.
#[derive(Clone, Copy)]
pub enum Filter<'a> {
    Name(&'a str),
    Predicate(Predicate<'a>),
    NameAnd(&'a str, Predicate<'a>),
}

impl fmt::Debug for Filter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Name(name) => write!(f, "Filter::Name({:?})", name),
            Filter::Predicate(_) => write!(f, "Filter::Predicate(..)"),
            Filter::NameAnd(name, _) => write!(f, "Filter::NameAnd({:?}, ..)", name),
        }
    }
}

impl Filter<'_> {
    fn validate(&self) -> Result<()> {
        match self {
            Filter::Name(name) | Filter::NameAnd(name, _) => check_name(name),
            Filter::Predicate(_) => Ok(()),
        }
    }

    pub fn matches(&self, document: &Document, element: Element) -> bool {
        match self {
            Filter::Name(name) => element.full_name(document) == *name,
            Filter::Predicate(predicate) => predicate(document, element),
            Filter::NameAnd(name, predicate) => {
                element.full_name(document) == *name && predicate(document, element)
            }
        }
    }

    fn select(&self, document: &Document, candidates: Vec<Element>) -> Vec<Element> {
        candidates
            .into_iter()
            .filter(|elem| self.matches(document, *elem))
            .collect()
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        Err(Error::invalid_argument("name is empty"))
    } else {
        Ok(())
    }
}

// Detached elements are skipped, an ancestor may have taken them along.
fn remove_all(document: &mut Document, elements: &[Element]) -> usize {
    let mut removed = 0;
    for elem in elements {
        if let Some(parent) = elem.parent(document) {
            if parent.remove_child_elem(document, *elem).is_ok() {
                removed += 1;
            }
        }
    }
    removed
}

// Pure variants
impl Document {
    /// Deep-copies `element`, applies `f` to the copy and returns the copy.
    pub fn with_change<F, R>(&mut self, element: Element, f: F) -> Result<Element>
    where
        F: FnOnce(&mut Document, Element) -> Result<R>,
    {
        let copy = element.deep_copy(self);
        f(self, copy)?;
        Ok(copy)
    }

    /// [`Document::with_change`] for every element, in order.
    pub fn with_changes<F, R>(&mut self, elements: &[Element], mut f: F) -> Result<Vec<Element>>
    where
        F: FnMut(&mut Document, Element) -> Result<R>,
    {
        elements
            .iter()
            .map(|elem| self.with_change(*elem, &mut f))
            .collect()
    }

    /// Flattens each element into its parent.
    ///
    /// The child elements of each element are moved right after it, or its
    /// text when it has no child elements. Its attributes are set on the
    /// parent, then the element is detached.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`]: An element has no parent. Nothing is
    ///   changed.
    pub fn promote(&mut self, elements: &[Element]) -> Result<()> {
        if let Some(orphan) = elements.iter().find(|elem| !elem.has_parent(self)) {
            return Err(Error::invalid_argument(format!(
                "cannot promote <{}> without parent",
                orphan.full_name(self)
            )));
        }
        for elem in elements {
            let parent = match elem.parent(self) {
                Some(parent) => parent,
                None => continue,
            };
            let nodes = if elem.has_child_elements(self) {
                let children = elem.child_elements(self);
                remove_all(self, &children);
                children.into_iter().map(Node::Element).collect()
            } else {
                let value = elem.value(self);
                if value.is_empty() {
                    Vec::new()
                } else {
                    vec![Node::Text(value)]
                }
            };
            elem.insert_after(self, nodes)?;
            let attributes = elem.attributes(self).to_vec();
            for attr in attributes {
                parent.set_attribute(self, attr.name, attr.value)?;
            }
            elem.detach(self)?;
        }
        Ok(())
    }
}

// In-place mutators
impl Element {
    /// Removes child elements matching `filter`. Returns how many.
    pub fn remove_by(&self, document: &mut Document, filter: Filter) -> Result<usize> {
        filter.validate()?;
        let targets = filter.select(document, self.child_elements(document));
        Ok(remove_all(document, &targets))
    }

    /// Removes descendant elements matching `filter`. Returns how many
    /// matches were removed from a parent.
    pub fn remove_by_all(&self, document: &mut Document, filter: Filter) -> Result<usize> {
        filter.validate()?;
        let targets = filter.select(document, self.child_elements_recursive(document));
        Ok(remove_all(document, &targets))
    }

    /// Renames child elements matching `filter`.
    pub fn change_names(&self, document: &mut Document, filter: Filter, name: &str) -> Result<()> {
        filter.validate()?;
        check_name(name)?;
        for child in filter.select(document, self.child_elements(document)) {
            child.set_name(document, name)?;
        }
        Ok(())
    }

    /// Sets the value of child elements matching `filter`.
    /// See [`Element::set_value`].
    pub fn change_values(&self, document: &mut Document, filter: Filter, value: &str) -> Result<()> {
        self.change_values_with(document, filter, |_, _| value.to_string())
    }

    /// Sets the value of child elements matching `filter` to `f(child)`.
    /// All new values are computed before the first one is set.
    pub fn change_values_with<F>(&self, document: &mut Document, filter: Filter, f: F) -> Result<()>
    where
        F: Fn(&Document, Element) -> String,
    {
        filter.validate()?;
        let updates: Vec<(Element, String)> = filter
            .select(document, self.child_elements(document))
            .into_iter()
            .map(|child| (child, f(document, child)))
            .collect();
        for (child, value) in updates {
            child.set_value(document, value);
        }
        Ok(())
    }

    /// Sets every attribute named `name` on descendant elements to `value`.
    /// Attributes of `self` are left alone.
    pub fn change_attribute_values(
        &self,
        document: &mut Document,
        name: &str,
        value: &str,
    ) -> Result<()> {
        check_name(name)?;
        let targets = self.child_elements_recursive(document);
        replace_attribute_values(document, &targets, name, None, value);
        Ok(())
    }

    /// Sets attributes named `name` on descendant elements to `new`, where
    /// their current value is `old`.
    pub fn change_attribute_values_where(
        &self,
        document: &mut Document,
        name: &str,
        old: &str,
        new: &str,
    ) -> Result<()> {
        check_name(name)?;
        let targets = self.child_elements_recursive(document);
        replace_attribute_values(document, &targets, name, Some(old), new);
        Ok(())
    }

    /// Like [`Element::change_attribute_values_where`], restricted to
    /// descendants named `descendant`.
    pub fn change_descendant_attribute_values(
        &self,
        document: &mut Document,
        descendant: &str,
        name: &str,
        old: &str,
        new: &str,
    ) -> Result<()> {
        check_name(descendant)?;
        check_name(name)?;
        let targets = self.descendants_named(document, descendant);
        replace_attribute_values(document, &targets, name, Some(old), new);
        Ok(())
    }

    /// On `self` and every descendant that has an attribute `name`, sets it
    /// to `value`, or removes it when `value` is `None`.
    pub fn set_attribute_values(
        &self,
        document: &mut Document,
        name: &str,
        value: Option<&str>,
    ) -> Result<()> {
        check_name(name)?;
        let mut targets = vec![*self];
        targets.extend(self.child_elements_recursive(document));
        for elem in targets {
            if elem.attribute(document, name).is_none() {
                continue;
            }
            match value {
                Some(value) => elem.set_attribute(document, name, value)?,
                None => {
                    elem.remove_attribute(document, name);
                }
            }
        }
        Ok(())
    }

    /// Removes every descendant named `old_name`. For each one removed, a
    /// new element `name` holding `content` is appended to its former
    /// parent.
    pub fn replace(
        &self,
        document: &mut Document,
        old_name: &str,
        name: &str,
        content: Option<&str>,
    ) -> Result<()> {
        check_name(old_name)?;
        check_name(name)?;
        let targets = self.descendants_named(document, old_name);
        let parents: Vec<Element> = targets
            .iter()
            .filter_map(|elem| elem.parent(document))
            .collect();
        remove_all(document, &targets);
        for parent in parents {
            let mut builder = Element::build(name);
            if let Some(content) = content {
                builder = builder.text_content(content);
            }
            builder.push_to(document, parent);
        }
        Ok(())
    }

    /// Strips prefixes from the names of `self`, its descendants, and their
    /// attributes, and drops all namespace declarations.
    pub fn remove_namespaces(&self, document: &mut Document) -> Result<()> {
        let mut targets = vec![*self];
        targets.extend(self.child_elements_recursive(document));
        for elem in targets {
            if elem.is_container() {
                continue;
            }
            let local = elem.name(document).to_string();
            elem.set_name(document, local)?;
            elem.mut_namespace_decls(document).clear();
            for attr in elem.mut_attributes(document) {
                let local = Element::separate_prefix_name(&attr.name).1.to_string();
                attr.name = local;
            }
        }
        Ok(())
    }

    /// Removes attributes named `name` from `self` and every descendant.
    /// Returns how many.
    pub fn remove_attributes_by(&self, document: &mut Document, name: &str) -> Result<usize> {
        check_name(name)?;
        let mut targets = vec![*self];
        targets.extend(self.child_elements_recursive(document));
        Ok(targets
            .into_iter()
            .map(|elem| elem.remove_attribute(document, name))
            .sum())
    }

    /// Removes descendants named `name` that have no attributes, no children
    /// and an empty value. Returns how many.
    pub fn remove_by_all_if_empty(&self, document: &mut Document, name: &str) -> Result<usize> {
        check_name(name)?;
        let targets: Vec<Element> = self
            .descendants_named(document, name)
            .into_iter()
            .filter(|elem| {
                !elem.has_attributes(document)
                    && !elem.has_child_elements(document)
                    && elem.value(document).is_empty()
            })
            .collect();
        Ok(remove_all(document, &targets))
    }

    /// Appends a new element `name` holding `text` to every child element,
    /// or to those matching `filter`.
    pub fn add_to_all(
        &self,
        document: &mut Document,
        filter: Option<Filter>,
        name: &str,
        text: Option<&str>,
    ) -> Result<()> {
        check_name(name)?;
        let mut targets = self.child_elements(document);
        if let Some(filter) = filter {
            filter.validate()?;
            targets = filter.select(document, targets);
        }
        for target in targets {
            let mut builder = Element::build(name);
            if let Some(text) = text {
                builder = builder.text_content(text);
            }
            builder.push_to(document, target);
        }
        Ok(())
    }
}

fn replace_attribute_values(
    document: &mut Document,
    targets: &[Element],
    name: &str,
    old: Option<&str>,
    new: &str,
) {
    for elem in targets {
        for attr in elem.mut_attributes(document) {
            if attr.name == name && old.map_or(true, |old| attr.value == old) {
                attr.value = new.to_string();
            }
        }
    }
}

// Copies
impl Element {
    pub fn with_remove_by(&self, document: &mut Document, filter: Filter) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.remove_by(doc, filter))
    }

    pub fn with_remove_by_all(&self, document: &mut Document, filter: Filter) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.remove_by_all(doc, filter))
    }

    pub fn with_change_names(
        &self,
        document: &mut Document,
        filter: Filter,
        name: &str,
    ) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.change_names(doc, filter, name))
    }

    pub fn with_change_values(
        &self,
        document: &mut Document,
        filter: Filter,
        value: &str,
    ) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.change_values(doc, filter, value))
    }

    pub fn with_change_values_with<F>(
        &self,
        document: &mut Document,
        filter: Filter,
        f: F,
    ) -> Result<Element>
    where
        F: Fn(&Document, Element) -> String,
    {
        document.with_change(*self, |doc, copy| copy.change_values_with(doc, filter, f))
    }

    pub fn with_change_attribute_values(
        &self,
        document: &mut Document,
        name: &str,
        value: &str,
    ) -> Result<Element> {
        document.with_change(*self, |doc, copy| {
            copy.change_attribute_values(doc, name, value)
        })
    }

    pub fn with_change_attribute_values_where(
        &self,
        document: &mut Document,
        name: &str,
        old: &str,
        new: &str,
    ) -> Result<Element> {
        document.with_change(*self, |doc, copy| {
            copy.change_attribute_values_where(doc, name, old, new)
        })
    }

    pub fn with_change_descendant_attribute_values(
        &self,
        document: &mut Document,
        descendant: &str,
        name: &str,
        old: &str,
        new: &str,
    ) -> Result<Element> {
        document.with_change(*self, |doc, copy| {
            copy.change_descendant_attribute_values(doc, descendant, name, old, new)
        })
    }

    pub fn with_set_attribute_values(
        &self,
        document: &mut Document,
        name: &str,
        value: Option<&str>,
    ) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.set_attribute_values(doc, name, value))
    }

    pub fn with_replace(
        &self,
        document: &mut Document,
        old_name: &str,
        name: &str,
        content: Option<&str>,
    ) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.replace(doc, old_name, name, content))
    }

    pub fn with_remove_namespaces(&self, document: &mut Document) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.remove_namespaces(doc))
    }

    pub fn with_remove_attributes_by(&self, document: &mut Document, name: &str) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.remove_attributes_by(doc, name))
    }

    pub fn with_remove_by_all_if_empty(
        &self,
        document: &mut Document,
        name: &str,
    ) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.remove_by_all_if_empty(doc, name))
    }

    pub fn with_add_to_all(
        &self,
        document: &mut Document,
        filter: Option<Filter>,
        name: &str,
        text: Option<&str>,
    ) -> Result<Element> {
        document.with_change(*self, |doc, copy| copy.add_to_all(doc, filter, name, text))
    }

    /// Copies `self`, then promotes every descendant of the copy matching
    /// `filter`. See [`Document::promote`].
    pub fn with_promote(&self, document: &mut Document, filter: Filter) -> Result<Element> {
        filter.validate()?;
        document.with_change(*self, |doc, copy| {
            let targets = filter.select(doc, copy.child_elements_recursive(doc));
            doc.promote(&targets)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(doc: &mut Document) -> Element {
        let record = Element::build("record").attribute("id", "r").finish(doc);
        Element::build("A")
            .attribute("type", "String")
            .text_content("a")
            .push_to(doc, record);
        Element::build("B")
            .attribute("type", "Int32")
            .text_content("1")
            .push_to(doc, record);
        Element::build("A")
            .attribute("type", "String")
            .text_content("aa")
            .push_to(doc, record);
        record
    }

    fn child_names(doc: &Document, elem: Element) -> Vec<String> {
        elem.child_elements(doc)
            .iter()
            .map(|child| child.full_name(doc).to_string())
            .collect()
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut doc = Document::new();
        let record = record(&mut doc);
        assert!(matches!(
            record.remove_by(&mut doc, Filter::Name("")),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            record.change_names(&mut doc, Filter::Name("A"), ""),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(child_names(&doc, record), vec!["A", "B", "A"]);
    }

    #[test]
    fn test_filter_kinds() {
        let mut doc = Document::new();
        let record = record(&mut doc);
        let long = |doc: &Document, elem: Element| elem.value(doc).len() > 1;
        assert_eq!(record.remove_by(&mut doc, Filter::NameAnd("A", &long)).unwrap(), 1);
        assert_eq!(child_names(&doc, record), vec!["A", "B"]);
        let is_b = |doc: &Document, elem: Element| elem.full_name(doc) == "B";
        assert_eq!(record.remove_by(&mut doc, Filter::Predicate(&is_b)).unwrap(), 1);
        assert_eq!(child_names(&doc, record), vec!["A"]);
    }

    #[test]
    fn test_change_values_with() {
        let mut doc = Document::new();
        let record = record(&mut doc);
        record
            .change_values_with(&mut doc, Filter::Name("A"), |doc, elem| {
                elem.value(doc).to_uppercase()
            })
            .unwrap();
        let values: Vec<String> = record
            .find_all(&doc, "A")
            .iter()
            .map(|elem| elem.value(&doc))
            .collect();
        assert_eq!(values, vec!["A", "AA"]);
    }

    #[test]
    fn test_promote() {
        let mut doc = Document::new();
        let root = Element::new(&mut doc, "root");
        let wrapper = Element::build("wrapper")
            .attribute("note", "x")
            .push_to(&mut doc, root);
        Element::build("A").push_to(&mut doc, wrapper);
        Element::build("B").push_to(&mut doc, wrapper);
        Element::build("after").push_to(&mut doc, root);
        let leaf = Element::build("leaf").text_content("t").push_to(&mut doc, root);

        doc.promote(&[wrapper, leaf]).unwrap();
        assert_eq!(child_names(&doc, root), vec!["A", "B", "after"]);
        assert_eq!(root.attribute(&doc, "note"), Some("x"));
        assert_eq!(root.children(&doc).last(), Some(&Node::Text("t".to_string())));
        assert!(!wrapper.has_parent(&doc));
    }

    #[test]
    fn test_promote_orphan_fails_first() {
        let mut doc = Document::new();
        let root = Element::new(&mut doc, "root");
        let inner = Element::build("inner").text_content("v").push_to(&mut doc, root);
        let orphan = Element::new(&mut doc, "orphan");
        assert!(matches!(
            doc.promote(&[inner, orphan]),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(inner.parent(&doc), Some(root));
    }

    #[test]
    fn test_with_changes() {
        let mut doc = Document::new();
        let first = record(&mut doc);
        let second = record(&mut doc);
        let copies = doc
            .with_changes(&[first, second], |doc, copy| {
                copy.remove_by(doc, Filter::Name("B"))
            })
            .unwrap();
        assert_eq!(copies.len(), 2);
        for copy in copies {
            assert_eq!(child_names(&doc, copy), vec!["A", "A"]);
        }
        assert_eq!(child_names(&doc, first), vec!["A", "B", "A"]);
    }
}
