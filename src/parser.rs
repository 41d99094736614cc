use crate::document::{Declaration, Document, Node};
use crate::element::{Attribute, Element};
use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use log::trace;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;

/// Options when parsing xml.
///
/// `empty_text_node`: `<tag></tag>` will have a `Node::Text("")` as its children, while `<tag />` won't.
///
/// `trim_text`: whitespace around text is removed, whitespace-only text is dropped.
///
/// `require_decl`: fail with [`Error::MalformedXML`] if the document does not start with `<?xml ...?>`.
///
/// `encoding`: label of the encoding to decode bytes with, when there is no BOM.
/// If `None`, the encoding is taken from the declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub empty_text_node: bool,
    pub trim_text: bool,
    pub require_decl: bool,
    pub encoding: Option<String>,
}

impl Default for ReadOptions {
    fn default() -> ReadOptions {
        ReadOptions {
            empty_text_node: true,
            trim_text: true,
            require_decl: true,
            encoding: None,
        }
    }
}

pub(crate) struct DocumentParser {
    document: Document,
    read_opts: ReadOptions,
    element_stack: Vec<Element>,
}

impl DocumentParser {
    fn new(opts: ReadOptions) -> DocumentParser {
        let document = Document::new();
        let container = document.container();
        DocumentParser {
            document,
            read_opts: opts,
            element_stack: vec![container],
        }
    }

    pub(crate) fn parse_str(s: &str, opts: ReadOptions) -> Result<Document> {
        let mut parser = DocumentParser::new(opts);
        let mut reader = Reader::from_str(s);
        reader.trim_text(parser.read_opts.trim_text);
        parser.parse_content(reader)?;
        Ok(parser.document)
    }

    pub(crate) fn parse_bytes(bytes: &[u8], opts: ReadOptions) -> Result<Document> {
        let text = decode(bytes, &opts)?;
        DocumentParser::parse_str(&text, opts)
    }

    fn handle_decl(&mut self, ev: &BytesDecl) -> Result<()> {
        let version = String::from_utf8(ev.version()?.to_vec())?;
        let encoding = match ev.encoding() {
            Some(res) => Some(String::from_utf8(res?.to_vec())?),
            None => None,
        };
        let standalone = match ev.standalone() {
            Some(res) => {
                let val = std::str::from_utf8(&*res?)?.to_lowercase();
                if val == "yes" {
                    Some(true)
                } else if val == "no" {
                    Some(false)
                } else {
                    return Err(Error::MalformedXML(
                        "Standalone Document Declaration has non boolean value".to_string(),
                    ));
                }
            }
            None => None,
        };
        self.document.set_declaration(Some(Declaration {
            version,
            encoding,
            standalone,
        }));
        Ok(())
    }

    fn current(&self) -> Element {
        // The container is never popped.
        self.element_stack[self.element_stack.len() - 1]
    }

    fn push_node(&mut self, node: Node) -> Result<()> {
        let parent = self.current();
        if parent.is_container() {
            if let Node::Text(_) | Node::CData(_) = node {
                return Err(Error::MalformedXML(
                    "Text content outside of the root element".to_string(),
                ));
            }
        }
        parent.push_child(&mut self.document, node)
    }

    fn handle_bytes_start(&mut self, ev: &BytesStart) -> Result<Element> {
        let full_name = String::from_utf8(ev.name().to_vec())?;
        let mut attributes = Vec::new();
        let mut namespaces = BTreeMap::new();
        for attr in ev.attributes() {
            let attr = attr?;
            let key = String::from_utf8(attr.key.to_vec())?;
            let value = String::from_utf8(attr.unescaped_value()?.to_vec())?;
            if key == "xmlns" {
                namespaces.insert(String::new(), value);
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                namespaces.insert(prefix.to_owned(), value);
            } else {
                attributes.push(Attribute { name: key, value });
            }
        }
        let element = Element::with_data(&mut self.document, full_name, attributes, namespaces);
        if self.current().is_container() && self.document.root_element().is_some() {
            return Err(Error::MalformedXML(
                "Document has more than one root element".to_string(),
            ));
        }
        self.push_node(Node::Element(element))?;
        Ok(element)
    }

    // Returns if document parsing is finished.
    fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Start(ref ev) => {
                let element = self.handle_bytes_start(ev)?;
                self.element_stack.push(element);
                Ok(false)
            }
            Event::End(_) => {
                if self.element_stack.len() == 1 {
                    return Err(Error::MalformedXML(
                        "Closing tag without opening tag".to_string(),
                    ));
                }
                // quick-xml checks if tag names match for us
                if let Some(elem) = self.element_stack.pop() {
                    // distinguish <tag></tag> and <tag />
                    if self.read_opts.empty_text_node && !elem.has_children(&self.document) {
                        elem.push_child(&mut self.document, Node::Text(String::new()))?;
                    }
                }
                Ok(false)
            }
            Event::Empty(ref ev) => {
                self.handle_bytes_start(ev)?;
                Ok(false)
            }
            Event::Text(ev) => {
                let content = String::from_utf8(ev.unescaped()?.to_vec())?;
                if self.current().is_container() && content.trim().is_empty() {
                    return Ok(false);
                }
                self.push_node(Node::Text(content))?;
                Ok(false)
            }
            // Comment and PI content is not escaped.
            Event::Comment(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::Comment(content))?;
                Ok(false)
            }
            Event::CData(ev) => {
                let content = String::from_utf8(ev.unescaped()?.to_vec())?;
                self.push_node(Node::CData(content))?;
                Ok(false)
            }
            Event::PI(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::PI(content))?;
                Ok(false)
            }
            Event::Decl(ev) => {
                self.handle_decl(&ev)?;
                Ok(false)
            }
            // Not kept in the tree.
            Event::DocType(_) => Ok(false),
            Event::Eof => {
                if self.element_stack.len() > 1 {
                    return Err(Error::MalformedXML(
                        "Unexpected end of document, missing closing tag".to_string(),
                    ));
                }
                Ok(true)
            }
        }
    }

    fn parse_content(&mut self, mut reader: Reader<&[u8]>) -> Result<()> {
        let mut buf = Vec::with_capacity(200); // reduce time increasing capacity at start.
        let mut first = true;
        loop {
            let ev = reader.read_event(&mut buf)?;
            trace!("{:?}", ev);
            if first && self.read_opts.require_decl && !matches!(ev, Event::Decl(_)) {
                return Err(Error::MalformedXML(
                    "Didn't find XML Declaration at the start of file".to_string(),
                ));
            }
            first = false;
            if self.handle_event(ev)? {
                return Ok(());
            }
            buf.clear();
        }
    }
}

// Look at the BOM, the given label, or the declaration to figure out the encoding.
fn decode(bytes: &[u8], opts: &ReadOptions) -> Result<String> {
    let (encoding, bom_len) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, bom_len),
        None => match &opts.encoding {
            Some(label) => (
                Encoding::for_label(label.as_bytes()).ok_or(Error::CannotDecode)?,
                0,
            ),
            None => (sniff_encoding(bytes)?, 0),
        },
    };
    let (text, malformed) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
    if malformed {
        return Err(Error::CannotDecode);
    }
    Ok(text.into_owned())
}

fn sniff_encoding(bytes: &[u8]) -> Result<&'static Encoding> {
    match bytes {
        [0x00, 0x3c, 0x00, 0x3f, ..] => Ok(UTF_16BE),
        [0x3c, 0x00, 0x3f, 0x00, ..] => Ok(UTF_16LE),
        [0x3c, 0x3f, ..] => match declared_encoding(bytes) {
            Some(label) => Encoding::for_label(label.as_bytes()).ok_or(Error::CannotDecode),
            None => Ok(UTF_8),
        },
        _ => Ok(UTF_8),
    }
}

// `encoding` pseudo-attribute of an ASCII compatible declaration.
fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let end = bytes.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&bytes[..end]).ok()?;
    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    rest.find(quote).map(|end| &rest[..end])
}

// Read
impl Document {
    /// Parses xml string.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedXML`]: Could not read XML.
    pub fn parse_str(s: &str) -> Result<Document> {
        DocumentParser::parse_str(s, ReadOptions::default())
    }

    pub fn parse_str_with_opts(s: &str, opts: ReadOptions) -> Result<Document> {
        DocumentParser::parse_str(s, opts)
    }

    /// Parses xml bytes, decoding them first.
    ///
    /// # Errors
    ///
    /// - [`Error::CannotDecode`]: Could not decode XML.
    /// - [`Error::MalformedXML`]: Could not read XML.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
        DocumentParser::parse_bytes(bytes, ReadOptions::default())
    }

    pub fn parse_bytes_with_opts(bytes: &[u8], opts: ReadOptions) -> Result<Document> {
        DocumentParser::parse_bytes(bytes, opts)
    }

    /// Parses xml from reader. The whole input is read into memory first.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`]: IO Error
    /// - [`Error::CannotDecode`]: Could not decode XML.
    /// - [`Error::MalformedXML`]: Could not read XML.
    pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
        Self::parse_reader_with_opts(reader, ReadOptions::default())
    }

    pub fn parse_reader_with_opts<R: Read>(mut reader: R, opts: ReadOptions) -> Result<Document> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        DocumentParser::parse_bytes(&bytes, opts)
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Document> {
        Document::parse_str(s)
    }
}
