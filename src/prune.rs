use crate::document::Document;
use crate::element::Element;
use log::trace;

// Column pruning
impl Document {
    /// Removes columns that carry no information across a set of records.
    ///
    /// The columns are the distinct child element names of the first record.
    /// For each column every descendant of that name in *any* record is
    /// collected. If all of them have the value `"0"`, or all of them have
    /// the value `""`, they are all detached. Otherwise the column is kept
    /// whole.
    ///
    /// Values are compared literally: `"0.0"` or `" "` keep a column alive.
    ///
    /// ```
    /// use xml_records::{Document, Element};
    ///
    /// let mut doc = Document::new();
    /// let records: Vec<Element> = (0..2)
    ///     .map(|i| {
    ///         let record = Element::new(&mut doc, "record");
    ///         Element::build("A").text_content(i.to_string()).push_to(&mut doc, record);
    ///         Element::build("Z").text_content("0").push_to(&mut doc, record);
    ///         record
    ///     })
    ///     .collect();
    /// doc.prune_columns(&records);
    /// assert!(records[1].find(&doc, "A").is_some());
    /// assert!(records[1].find(&doc, "Z").is_none());
    /// ```
    pub fn prune_columns(&mut self, records: &[Element]) {
        let first = match records.first() {
            Some(first) => *first,
            None => return,
        };
        let mut columns: Vec<String> = Vec::new();
        for child in first.child_elements(self) {
            let name = child.full_name(self);
            if !columns.iter().any(|column| column == name) {
                columns.push(name.to_string());
            }
        }

        for column in columns {
            let cells: Vec<Element> = records
                .iter()
                .flat_map(|record| record.descendants_named(self, &column))
                .collect();
            if cells.is_empty() {
                continue;
            }
            let values: Vec<String> = cells.iter().map(|cell| cell.value(self)).collect();
            let all_zero = values.iter().all(|value| value == "0");
            let all_empty = values.iter().all(|value| value.is_empty());
            if !all_zero && !all_empty {
                continue;
            }
            trace!("pruning column {} from {} records", column, records.len());
            for cell in cells {
                // Nested cells may already be gone with their ancestor.
                if let Some(parent) = cell.parent(self) {
                    let _ = parent.remove_child_elem(self, cell);
                }
            }
        }
    }
}
