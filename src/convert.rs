use crate::document::Document;
use crate::element::Element;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d %B %Y"];

// Leaf value conversions
impl Element {
    /// `true`/`false` in any case, or `1`/`0`.
    pub fn to_bool(&self, document: &Document) -> Option<bool> {
        let value = self.value(document);
        let value = value.trim();
        if value.eq_ignore_ascii_case("true") || value == "1" {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") || value == "0" {
            Some(false)
        } else {
            None
        }
    }

    /// Integer value, ignoring `$` and `,`: `"$1,024"` is `1024`.
    pub fn to_long(&self, document: &Document) -> Option<i64> {
        let value = self.value(document).replace(|c: char| c == '$' || c == ',', "");
        value.trim().parse().ok()
    }

    /// Floating point value, ignoring `$`.
    pub fn to_double(&self, document: &Document) -> Option<f64> {
        let value = self.value(document).replace('$', "");
        value.trim().parse().ok()
    }

    /// Date and time value.
    ///
    /// Accepts RFC 3339 (converted to UTC), `2021-03-04 05:06:07`,
    /// `2021-03-04T05:06:07`, `03/04/2021 05:06:07`, `2021-03-04 05:06`,
    /// and the dates `2021-03-04`, `03/04/2021`, `4 March 2021` at midnight.
    pub fn to_datetime(&self, document: &Document) -> Option<NaiveDateTime> {
        parse_datetime(self.value(document).trim())
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(doc: &mut Document, text: &str) -> Element {
        Element::build("v").text_content(text).finish(doc)
    }

    #[test]
    fn test_to_bool() {
        let mut doc = Document::new();
        for (text, expected) in &[
            ("True", Some(true)),
            ("false", Some(false)),
            ("1", Some(true)),
            ("0", Some(false)),
            (" TRUE ", Some(true)),
            ("yes", None),
            ("", None),
        ] {
            let elem = leaf(&mut doc, text);
            assert_eq!(elem.to_bool(&doc), *expected, "{:?}", text);
        }
    }

    #[test]
    fn test_to_numbers() {
        let mut doc = Document::new();
        let money = leaf(&mut doc, "$1,024");
        assert_eq!(money.to_long(&doc), Some(1024));
        let price = leaf(&mut doc, "$3.5");
        assert_eq!(price.to_double(&doc), Some(3.5));
        assert_eq!(price.to_long(&doc), None);
        let text = leaf(&mut doc, "n/a");
        assert_eq!(text.to_double(&doc), None);
    }

    #[test]
    fn test_to_datetime() {
        let mut doc = Document::new();
        let expected = NaiveDate::from_ymd_opt(2021, 3, 4)
            .and_then(|date| date.and_hms_opt(5, 6, 7))
            .unwrap();
        for text in &[
            "2021-03-04 05:06:07",
            "2021-03-04T05:06:07",
            "2021-03-04T07:06:07+02:00",
            "03/04/2021 05:06:07",
        ] {
            let elem = leaf(&mut doc, text);
            assert_eq!(elem.to_datetime(&doc), Some(expected), "{:?}", text);
        }
        let date = leaf(&mut doc, "4 March 2021");
        assert_eq!(
            date.to_datetime(&doc),
            NaiveDate::from_ymd_opt(2021, 3, 4).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        let bad = leaf(&mut doc, "yesterday");
        assert_eq!(bad.to_datetime(&doc), None);
    }
}
