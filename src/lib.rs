//! Project typed values into XML record trees, prune and sort them,
//! edit them in bulk, and write them as text.
//!
//! ```
//! use xml_records::{projectable, Document, SortKey};
//!
//! struct Row {
//!     code: String,
//!     qty: i32,
//! }
//! projectable!(Row { code: String, qty: i32 });
//!
//! let rows = vec![
//!     Row { code: "a".into(), qty: 0 },
//!     Row { code: "b".into(), qty: 0 },
//! ];
//! let mut doc = Document::from_records(&rows).unwrap();
//! doc.order_by(&[SortKey::desc("code")]).unwrap();
//! let xml = doc.to_xml_string().unwrap();
//! assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n<root>"));
//! // `qty` is zero in every record
//! assert!(!xml.contains("qty"));
//! ```

mod chars;
mod convert;
mod document;
mod element;
mod error;
mod mutate;
mod order;
mod parser;
mod project;
mod prune;
mod writer;

pub use crate::chars::{is_xml_char, strip_invalid_chars};
pub use crate::document::{Declaration, Document, Node};
pub use crate::element::{Attribute, Element, ElementBuilder};
pub use crate::error::{Error, Result};
pub use crate::mutate::{Filter, Predicate};
pub use crate::order::{SortKey, SortOrder};
pub use crate::parser::ReadOptions;
pub use crate::project::{
    Field, FieldValue, Projectable, Shape, TypeAnnotation, RECORD, ROOT, TYPE_ATTRIBUTE,
};
pub use crate::writer::{LineEnding, WriteOptions};
