use xml_records::{Document, Error, Node, ReadOptions};

fn no_decl() -> ReadOptions {
    ReadOptions {
        require_decl: false,
        ..ReadOptions::default()
    }
}

#[test]
fn test_closing_tag_mismatch_err() {
    // no closing tag
    let xml = "<img>";
    let doc = Document::parse_str_with_opts(xml, no_decl());
    assert!(matches!(doc.unwrap_err(), Error::MalformedXML(_)));

    // closing tag mismatch
    let xml = "<a><img>Te</a>xt</img>";
    let doc = Document::parse_str_with_opts(xml, no_decl());
    assert!(matches!(doc.unwrap_err(), Error::MalformedXML(_)));

    // no opening tag
    let xml = "</abc>";
    let doc = Document::parse_str_with_opts(xml, no_decl());
    assert!(matches!(doc.unwrap_err(), Error::MalformedXML(_)));
}

#[test]
fn test_parse_reader() {
    let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n<root>\r\n  <record>\r\n    <A>a</A>\r\n  </record>\r\n</root>";
    let doc = Document::parse_reader(xml.as_bytes()).unwrap();
    let root = doc.root_element().unwrap();
    let records = root.child_elements(&doc);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].find(&doc, "A").unwrap().value(&doc), "a");

    let decl = doc.declaration().unwrap();
    assert_eq!(decl.version, "1.0");
    assert_eq!(decl.encoding.as_deref(), Some("UTF-8"));
    assert_eq!(decl.standalone, None);
}

#[test]
fn test_keep_whitespace() {
    let opts = ReadOptions {
        trim_text: false,
        ..no_decl()
    };
    let doc = Document::parse_str_with_opts("<r> a </r>", opts).unwrap();
    assert_eq!(doc.root_element().unwrap().value(&doc), " a ");

    let doc = Document::parse_str_with_opts("<r> a </r>", no_decl()).unwrap();
    assert_eq!(doc.root_element().unwrap().value(&doc), "a");
}

#[test]
fn test_empty_text_node() {
    let opts = ReadOptions {
        empty_text_node: false,
        ..no_decl()
    };
    let doc = Document::parse_str_with_opts("<r><a></a><b/></r>", opts).unwrap();
    let root = doc.root_element().unwrap();
    for child in root.child_elements(&doc) {
        assert!(!child.has_children(&doc));
    }
}

#[test]
fn test_misc_nodes() {
    let xml = "<?xml version=\"1.0\"?><!DOCTYPE r><!--c--><r><![CDATA[<x>]]></r><?pi data?>";
    let doc = Document::parse_str(xml).unwrap();
    let nodes = doc.root_nodes();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0], Node::Comment("c".to_string()));
    assert_eq!(nodes[2], Node::PI("pi data".to_string()));
    let root = doc.root_element().unwrap();
    assert_eq!(root.children(&doc), &vec![Node::CData("<x>".to_string())]);
    assert_eq!(root.value(&doc), "<x>");
}

#[test]
fn test_text_outside_root() {
    assert!(matches!(
        Document::parse_str_with_opts("<r/>tail", no_decl()),
        Err(Error::MalformedXML(_))
    ));
}

#[test]
fn test_forced_encoding() {
    let opts = ReadOptions {
        encoding: Some("windows-1252".to_string()),
        ..no_decl()
    };
    let doc = Document::parse_bytes_with_opts(b"<r>\x80</r>", opts).unwrap();
    assert_eq!(doc.root_element().unwrap().value(&doc), "\u{20ac}");

    let opts = ReadOptions {
        encoding: Some("no-such-encoding".to_string()),
        ..no_decl()
    };
    assert!(matches!(
        Document::parse_bytes_with_opts(b"<r/>", opts),
        Err(Error::CannotDecode)
    ));
}
