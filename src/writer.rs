use crate::chars::{find_invalid_char, strip_invalid_chars};
use crate::document::{Declaration, Document, Node};
use crate::element::Element;
use crate::error::{Error, Result};
use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Line terminator used for every line break of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    CrLf,
    Lf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Options when writing xml.
///
/// Defaults to two spaces per depth level and `\r\n` line endings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub indent_size: usize,
    pub line_ending: LineEnding,
}

impl Default for WriteOptions {
    fn default() -> WriteOptions {
        WriteOptions {
            indent_size: 2,
            line_ending: LineEnding::CrLf,
        }
    }
}

// Write
impl Document {
    /// Writes document as xml string.
    ///
    /// A document without declaration is written with
    /// `<?xml version="1.0" encoding="UTF-8" standalone="yes"?>`.
    ///
    /// If some text holds characters that are not allowed in XML, the text of
    /// every grandchild of the root element is stripped of those characters
    /// and writing is retried once. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::Serialization`]: The retry failed as well, e.g. because the
    /// illegal character sits in an attribute or deeper in the tree.
    pub fn to_xml_string(&self) -> Result<String> {
        self.to_xml_string_with_opts(&WriteOptions::default())
    }

    pub fn to_xml_string_with_opts(&self, opts: &WriteOptions) -> Result<String> {
        match self.render(opts) {
            Ok(xml) => Ok(xml),
            Err(err) => {
                debug!("{}, writing again with record fields sanitized", err);
                let mut sanitized = self.clone();
                sanitized.sanitize_record_fields();
                sanitized
                    .render(opts)
                    .map_err(|err| Error::Serialization(err.to_string()))
            }
        }
    }

    /// Write document to writer. Will be written in UTF-8.
    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        self.write_with_opts(writer, &WriteOptions::default())
    }

    pub fn write_with_opts(&self, writer: &mut impl Write, opts: &WriteOptions) -> Result<()> {
        let xml = self.to_xml_string_with_opts(opts)?;
        writer.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn render(&self, opts: &WriteOptions) -> Result<String> {
        self.check_chars(self.container())?;
        let mut buf: Vec<u8> = Vec::with_capacity(200);
        {
            let mut writer = Writer::new_with_indent(&mut buf, b' ', opts.indent_size);
            self.write_decl(&mut writer)?;
            self.write_nodes(&mut writer, self.container().children(self))?;
            writer.write_event(Event::Eof)?;
        }
        let xml = String::from_utf8(buf)?;
        Ok(normalize_line_endings(&xml, opts.line_ending))
    }

    fn check_chars(&self, element: Element) -> Result<()> {
        let invalid = |character| Error::InvalidXmlChar {
            element: element.full_name(self).to_string(),
            character,
        };
        for attr in element.attributes(self) {
            if let Some(c) = find_invalid_char(&attr.value) {
                return Err(invalid(c));
            }
        }
        for value in element.namespace_decls(self).values() {
            if let Some(c) = find_invalid_char(value) {
                return Err(invalid(c));
            }
        }
        for node in element.children(self) {
            match node {
                Node::Element(child) => self.check_chars(*child)?,
                Node::Text(text) | Node::CData(text) => {
                    if let Some(c) = find_invalid_char(text) {
                        return Err(invalid(c));
                    }
                }
                Node::Comment(text) => {
                    if let Some(c) = find_invalid_char(text) {
                        return Err(invalid(c));
                    }
                    if text.contains("--") || text.ends_with('-') {
                        return Err(Error::Serialization(format!(
                            "comment {:?} in <{}> contains \"--\" or ends with \"-\"",
                            text,
                            element.full_name(self)
                        )));
                    }
                }
                Node::PI(text) => {
                    if let Some(c) = find_invalid_char(text) {
                        return Err(invalid(c));
                    }
                    if text.contains("?>") {
                        return Err(Error::Serialization(format!(
                            "processing instruction {:?} in <{}> contains \"?>\"",
                            text,
                            element.full_name(self)
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    // Only root > record > field values are repaired.
    fn sanitize_record_fields(&mut self) {
        let root = match self.root_element() {
            Some(root) => root,
            None => return,
        };
        for record in root.child_elements(self) {
            for field in record.child_elements(self) {
                let value = field.value(self);
                if let std::borrow::Cow::Owned(stripped) = strip_invalid_chars(&value) {
                    field.set_value(self, stripped);
                }
            }
        }
    }

    fn write_decl(&self, writer: &mut Writer<impl Write>) -> Result<()> {
        let default = Declaration::default();
        let decl = self.declaration().unwrap_or(&default);
        let standalone = decl.standalone.map(|standalone| match standalone {
            true => "yes".as_bytes(),
            false => "no".as_bytes(),
        });
        writer.write_event(Event::Decl(BytesDecl::new(
            decl.version.as_bytes(),
            decl.encoding.as_ref().map(|s| s.as_bytes()),
            standalone,
        )))?;
        Ok(())
    }

    fn write_nodes(&self, writer: &mut Writer<impl Write>, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            match node {
                Node::Element(eid) => self.write_element(writer, *eid)?,
                Node::Text(text) => {
                    writer.write_event(Event::Text(BytesText::from_plain_str(text)))?
                }
                // Comment, CData, and PI content is not escaped.
                Node::Comment(text) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped_str(text)))?
                }
                Node::CData(text) => {
                    writer.write_event(Event::CData(BytesText::from_escaped_str(text)))?
                }
                Node::PI(text) => {
                    writer.write_event(Event::PI(BytesText::from_escaped_str(text)))?
                }
            };
        }
        Ok(())
    }

    fn write_element(&self, writer: &mut Writer<impl Write>, element: Element) -> Result<()> {
        let name_bytes = element.full_name(self).as_bytes();
        let mut start = BytesStart::borrowed_name(name_bytes);
        for (prefix, val) in element.namespace_decls(self) {
            let attr_name = if prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{}", prefix)
            };
            start.push_attribute((attr_name.as_bytes(), val.as_bytes()));
        }
        for attr in element.attributes(self) {
            start.push_attribute((attr.name.as_bytes(), attr.value.as_bytes()));
        }
        if element.has_children(self) {
            writer.write_event(Event::Start(start))?;
            self.write_nodes(writer, element.children(self))?;
            writer.write_event(Event::End(BytesEnd::borrowed(name_bytes)))?;
        } else {
            writer.write_event(Event::Empty(start))?;
        }
        Ok(())
    }
}

// quick-xml breaks lines with `\n`; text may bring `\r\n` or `\r` of its own.
fn normalize_line_endings(xml: &str, line_ending: LineEnding) -> String {
    let unified = xml.replace("\r\n", "\n").replace('\r', "\n");
    match line_ending {
        LineEnding::Lf => unified,
        LineEnding::CrLf => unified.replace('\n', "\r\n"),
    }
}
