//! Projection of typed values into `record` elements.
//!
//! A value describes itself through [`Projectable::shape`]: it is either an
//! element already, a primitive written as text, or a record of named
//! fields. Records become
//!
//! ```xml
//! <record>
//!   <Name type="String">value</Name>
//!   ...
//! </record>
//! ```
//!
//! Use the [`projectable!`](crate::projectable) macro to implement the trait
//! for a struct.

use crate::document::{Document, Node};
use crate::element::{Attribute, Element};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::collections::HashSet;

/// Name of the element wrapping one projected value.
pub const RECORD: &str = "record";
/// Name of the element wrapping a projected collection.
pub const ROOT: &str = "root";
/// Attribute carrying the type of a projected field.
pub const TYPE_ATTRIBUTE: &str = "type";

/// How a value is projected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// No value. Cannot be projected on its own.
    Absent,
    /// Used as is.
    Element(Element),
    /// Becomes a `record` leaf with this text.
    Primitive(String),
    /// Becomes a `record` with one child per field.
    Record(Vec<Field>),
}

/// Values that can be turned into a `record` element.
pub trait Projectable {
    fn shape(&self) -> Shape;
}

/// One projected field: `<name type="type_name">value</name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    /// `None` is written as an element without content.
    pub value: Option<String>,
}

impl Field {
    pub fn new<N: Into<String>>(name: N, type_name: String, value: Option<String>) -> Field {
        Field {
            name: name.into(),
            type_name,
            value,
        }
    }

    /// Field for a value of type `T`, annotated with [`TypeAnnotation::of`].
    pub fn of<T: FieldValue + ?Sized>(name: &str, value: &T) -> Field {
        Field::new(name, TypeAnnotation::of::<T>(), value.field_text())
    }

    /// Merges field lists of several capabilities of one value.
    ///
    /// A field name seen before is skipped, so the first group that
    /// declares a field decides its position and content.
    pub fn union<I>(groups: I) -> Vec<Field>
    where
        I: IntoIterator<Item = Vec<Field>>,
    {
        let mut seen = HashSet::new();
        groups
            .into_iter()
            .flatten()
            .filter(|field| seen.insert(field.name.clone()))
            .collect()
    }
}

/// Text of a field value. `None` for an absent value.
pub trait FieldValue {
    fn field_text(&self) -> Option<String>;
}

macro_rules! impl_display_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn field_text(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }

            impl Projectable for $ty {
                fn shape(&self) -> Shape {
                    Shape::Primitive(self.to_string())
                }
            }
        )*
    };
}

impl_display_value!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String,
    str
);

impl<T: FieldValue> FieldValue for Option<T> {
    fn field_text(&self) -> Option<String> {
        self.as_ref().and_then(FieldValue::field_text)
    }
}

impl<T: FieldValue + ?Sized> FieldValue for &T {
    fn field_text(&self) -> Option<String> {
        (**self).field_text()
    }
}

impl<T: FieldValue + ?Sized> FieldValue for Box<T> {
    fn field_text(&self) -> Option<String> {
        (**self).field_text()
    }
}

impl Projectable for Element {
    fn shape(&self) -> Shape {
        Shape::Element(*self)
    }
}

impl<T: Projectable> Projectable for Option<T> {
    fn shape(&self) -> Shape {
        match self {
            Some(value) => value.shape(),
            None => Shape::Absent,
        }
    }
}

impl<T: Projectable + ?Sized> Projectable for &T {
    fn shape(&self) -> Shape {
        (**self).shape()
    }
}

impl<T: Projectable + ?Sized> Projectable for Box<T> {
    fn shape(&self) -> Shape {
        (**self).shape()
    }
}

/// Implements [`Projectable`] for a struct from a list of its fields.
///
/// Fields become record children in the listed order; every field type must
/// implement [`FieldValue`].
///
/// ```
/// use xml_records::{projectable, Document};
///
/// struct Item {
///     code: String,
///     count: i32,
///     note: Option<String>,
/// }
///
/// projectable!(Item { code: String, count: i32, note: Option<String> });
///
/// let mut doc = Document::new();
/// let item = Item { code: "A1".into(), count: 3, note: None };
/// let record = doc.project(&item).unwrap();
/// let count = record.find(&doc, "count").unwrap();
/// assert_eq!(count.value(&doc), "3");
/// assert_eq!(count.attribute(&doc, "type"), Some("i32"));
/// ```
#[macro_export]
macro_rules! projectable {
    ($ty:ty { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Projectable for $ty {
            fn shape(&self) -> $crate::Shape {
                $crate::Shape::Record(vec![
                    $( $crate::Field::of::<$fty>(stringify!($field), &self.$field) ),*
                ])
            }
        }
    };
}

/// The `type` attribute of projected fields.
pub struct TypeAnnotation;

impl TypeAnnotation {
    /// Last path segment of the type name. Generic types keep their first
    /// type argument as full path: `Option<alloc::string::String>`.
    pub fn of<T: ?Sized>() -> String {
        Self::from_type_name(std::any::type_name::<T>())
    }

    pub fn from_type_name(full: &str) -> String {
        // Tuples, arrays and slices are kept whole, their paths are inside.
        if full.starts_with('(') || full.starts_with('[') {
            return full.to_string();
        }
        let open = match full.find('<') {
            Some(open) => open,
            None => return last_segment(full).to_string(),
        };
        let outer = last_segment(&full[..open]);
        let args = &full[open + 1..];
        let mut depth = 0usize;
        let mut end = args.len();
        for (i, c) in args.char_indices() {
            match c {
                '<' | '(' | '[' => depth += 1,
                '>' | ')' | ']' if depth > 0 => depth -= 1,
                ',' | '>' if depth == 0 => {
                    end = i;
                    break;
                }
                _ => {}
            }
        }
        format!("{}<{}>", outer, args[..end].trim())
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

// Projection
impl Document {
    /// Projects one value into a detached `record` element.
    ///
    /// Elements are returned unchanged. Primitives become a `record` leaf.
    /// Records become a `record` with one child per field, each carrying a
    /// `type` attribute.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`]: The value is absent.
    pub fn project<P: Projectable + ?Sized>(&mut self, value: &P) -> Result<Element> {
        let shape = value.shape();
        if shape == Shape::Absent {
            return Err(Error::invalid_argument("projected value is absent"));
        }
        Ok(self.build_shape(shape))
    }

    /// Projects every value and wraps the records in a detached `root`
    /// element, then prunes columns that are empty or zero in every record.
    ///
    /// Elements that already have a parent are deep-copied.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`]: Any value is absent. Nothing is created.
    pub fn project_many<I>(&mut self, values: I) -> Result<Element>
    where
        I: IntoIterator,
        I::Item: Projectable,
    {
        let shapes: Vec<Shape> = values.into_iter().map(|value| value.shape()).collect();
        self.build_root(shapes)
    }

    /// Like [`Document::project_many`], with [`Projectable::shape`] evaluated
    /// on `threads` worker threads. Records are built and pruned after all
    /// workers have finished.
    pub fn project_many_par<P>(&mut self, values: &[P], threads: usize) -> Result<Element>
    where
        P: Projectable + Sync,
    {
        let threads = threads.clamp(1, values.len().max(1));
        let chunk_size = values.len() / threads + (values.len() % threads != 0) as usize;
        let chunk_size = chunk_size.max(1);
        let shapes: Vec<Shape> = std::thread::scope(|scope| {
            let workers: Vec<_> = values
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || chunk.iter().map(Projectable::shape).collect::<Vec<_>>())
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| match worker.join() {
                    Ok(shapes) => shapes,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });
        self.build_root(shapes)
    }

    /// New document whose root element is [`Document::project_many`] of
    /// `values`, with the default declaration.
    pub fn from_records<I>(values: I) -> Result<Document>
    where
        I: IntoIterator,
        I::Item: Projectable,
    {
        let mut document = Document::new();
        let root = document.project_many(values)?;
        document.set_root_element(root)?;
        document.ensure_declaration();
        Ok(document)
    }

    fn build_root(&mut self, shapes: Vec<Shape>) -> Result<Element> {
        if shapes.iter().any(|shape| *shape == Shape::Absent) {
            return Err(Error::invalid_argument("projected collection holds an absent value"));
        }
        let root = Element::new(self, ROOT);
        let mut records = Vec::with_capacity(shapes.len());
        for shape in shapes {
            let record = match shape {
                Shape::Element(elem) if elem.has_parent(self) || elem.is_container() => {
                    elem.deep_copy(self)
                }
                shape => self.build_shape(shape),
            };
            root.attach(self, Node::Element(record));
            records.push(record);
        }
        self.prune_columns(&records);
        Ok(root)
    }

    // Shape must not be `Absent`.
    fn build_shape(&mut self, shape: Shape) -> Element {
        match shape {
            Shape::Element(elem) => elem,
            Shape::Absent => Element::new(self, RECORD),
            Shape::Primitive(text) => {
                let record = Element::new(self, RECORD);
                record.attach(self, Node::Text(text));
                record
            }
            Shape::Record(fields) => {
                let record = Element::new(self, RECORD);
                for field in fields {
                    let item = Element::with_data(
                        self,
                        field.name,
                        vec![Attribute::new(TYPE_ATTRIBUTE, field.type_name)],
                        BTreeMap::new(),
                    );
                    if let Some(text) = field.value {
                        item.attach(self, Node::Text(text));
                    }
                    record.attach(self, Node::Element(item));
                }
                record
            }
        }
    }
}
