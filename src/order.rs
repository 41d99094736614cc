use crate::document::{Document, Node};
use crate::element::Element;
use crate::error::{Error, Result};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
    /// A direction the sorter does not know. Sorting with it fails.
    Unspecified,
}

impl SortOrder {
    /// `"asc"`, `"ascending"`, `"ASC"`, ... are ascending, anything else
    /// is descending.
    pub fn from_token(token: &str) -> SortOrder {
        if token.to_lowercase().starts_with("asc") {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

/// A record child name and the direction to sort its values in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub name: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn new<S: Into<String>>(name: S, order: SortOrder) -> SortKey {
        SortKey {
            name: name.into(),
            order,
        }
    }

    pub fn asc<S: Into<String>>(name: S) -> SortKey {
        SortKey::new(name, SortOrder::Ascending)
    }

    pub fn desc<S: Into<String>>(name: S) -> SortKey {
        SortKey::new(name, SortOrder::Descending)
    }

    fn compare(&self, a: &Option<String>, b: &Option<String>) -> Ordering {
        match self.order {
            SortOrder::Descending => b.cmp(a),
            _ => a.cmp(b),
        }
    }
}

// Sort
impl Document {
    /// Reorders the child elements of the root element.
    ///
    /// Records are compared by the value of their first child named after
    /// each key, in key order. A record without such a child sorts before
    /// any value. Values are compared as strings, so `"10"` comes before
    /// `"2"`. The sort is stable, and nodes of the root that are not
    /// elements keep their positions.
    ///
    /// A key with an empty name matches no child.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedOperation`]: A key has [`SortOrder::Unspecified`].
    ///   The document is left unchanged.
    ///
    /// ```
    /// use xml_records::{Document, SortKey};
    ///
    /// let mut doc: Document = "<?xml version=\"1.0\"?>\
    ///     <root><record><A>a</A></record><record><A>c</A></record></root>"
    ///     .parse()
    ///     .unwrap();
    /// doc.order_by(&[SortKey::desc("A")]).unwrap();
    /// let root = doc.root_element().unwrap();
    /// let first = root.child_elements(&doc)[0];
    /// assert_eq!(first.value(&doc), "c");
    /// ```
    pub fn order_by(&mut self, keys: &[SortKey]) -> Result<()> {
        if let Some(key) = keys.iter().find(|key| key.order == SortOrder::Unspecified) {
            return Err(Error::UnsupportedOperation(format!(
                "unknown sort direction for key '{}'",
                key.name
            )));
        }
        if keys.is_empty() {
            return Ok(());
        }
        let root = match self.root_element() {
            Some(root) => root,
            None => return Ok(()),
        };

        let mut rows: Vec<(Element, Vec<Option<String>>)> = root
            .child_elements(self)
            .into_iter()
            .map(|record| {
                let values = keys
                    .iter()
                    .map(|key| record.find(self, &key.name).map(|cell| cell.value(self)))
                    .collect();
                (record, values)
            })
            .collect();
        rows.sort_by(|(_, a), (_, b)| {
            keys.iter()
                .enumerate()
                .fold(Ordering::Equal, |ord, (i, key)| {
                    ord.then_with(|| key.compare(&a[i], &b[i]))
                })
        });

        let mut sorted = rows.into_iter().map(|(record, _)| record);
        let children: Vec<Node> = root
            .children(self)
            .iter()
            .map(|node| match node {
                Node::Element(_) => sorted.next().map(Node::Element).unwrap_or_else(|| node.clone()),
                other => other.clone(),
            })
            .collect();
        root.set_children(self, children);
        Ok(())
    }

    /// Sorts with keys written as `"Name"`, `"Name|asc"` or `"Name|desc"`.
    ///
    /// A missing direction is ascending, and any direction starting with
    /// `asc` (any case) is ascending too. Names are matched without regard
    /// to case against the local names of the first record's children. A
    /// name that matches nothing still takes its place in the key list but
    /// ties every record. Empty tokens are skipped.
    pub fn order_by_strs<I, S>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary: Vec<Element> = self
            .root_element()
            .and_then(|root| root.child_elements(self).first().copied())
            .map(|record| record.child_elements(self))
            .unwrap_or_default();

        let keys: Vec<SortKey> = tokens
            .into_iter()
            .filter_map(|token| {
                let token: &str = token.as_ref();
                if token.is_empty() {
                    return None;
                }
                let (name, direction) = token.split_once('|').unwrap_or((token, "asc"));
                let direction = direction.split('|').next().unwrap_or(direction);
                let wanted = name.to_lowercase();
                let resolved = vocabulary
                    .iter()
                    .find(|elem| elem.name(self).to_lowercase() == wanted)
                    .map(|elem| elem.full_name(self).to_string())
                    .unwrap_or_default();
                Some(SortKey::new(resolved, SortOrder::from_token(direction)))
            })
            .collect();
        self.order_by(&keys)
    }
}
