//! XML 1.0 `Char` production.
//!
//! `Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]`

use std::borrow::Cow;

/// Whether `c` may appear in XML 1.0 content.
#[inline]
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x9 | 0xA | 0xD | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x1_0000..=0x10_FFFF
    )
}

pub(crate) fn find_invalid_char(text: &str) -> Option<char> {
    text.chars().find(|c| !is_xml_char(*c))
}

/// Drops every character that is not allowed in XML 1.0 content.
/// Borrows when there is nothing to drop.
pub fn strip_invalid_chars(text: &str) -> Cow<'_, str> {
    if find_invalid_char(text).is_none() {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}
