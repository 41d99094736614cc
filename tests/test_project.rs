use xml_records::{
    projectable, Document, Element, Error, Field, Projectable, Shape, TypeAnnotation,
};

#[allow(non_snake_case)]
struct Sample {
    A: String,
    B: String,
    C: String,
    HTS10: String,
    Z: Option<String>,
    ZZ: String,
}

projectable!(Sample {
    A: String,
    B: String,
    C: String,
    HTS10: String,
    Z: Option<String>,
    ZZ: String,
});

fn sample() -> Sample {
    Sample {
        A: "A".to_string(),
        B: "B".to_string(),
        C: "C".to_string(),
        HTS10: "0123456789".to_string(),
        Z: None,
        ZZ: "0".to_string(),
    }
}

fn field_names(doc: &Document, record: Element) -> Vec<&str> {
    record
        .child_elements(doc)
        .into_iter()
        .map(|field| field.full_name(doc))
        .collect()
}

#[test]
fn test_project_record() {
    let mut doc = Document::new();
    let record = doc.project(&sample()).unwrap();
    assert_eq!(record.full_name(&doc), "record");
    assert_eq!(
        field_names(&doc, record),
        vec!["A", "B", "C", "HTS10", "Z", "ZZ"]
    );

    let hts = record.find(&doc, "HTS10").unwrap();
    assert_eq!(hts.value(&doc), "0123456789");
    assert_eq!(hts.attribute(&doc, "type"), Some("String"));

    let z = record.find(&doc, "Z").unwrap();
    assert!(!z.has_children(&doc));
    assert_eq!(
        z.attribute(&doc, "type"),
        Some("Option<alloc::string::String>")
    );
}

#[test]
fn test_project_many_prunes() {
    let mut doc = Document::new();
    let samples = vec![sample(), sample(), sample()];
    let root = doc.project_many(&samples).unwrap();
    assert_eq!(root.full_name(&doc), "root");
    let records = root.child_elements(&doc);
    assert_eq!(records.len(), 3);
    for record in records {
        assert_eq!(field_names(&doc, record), vec!["A", "B", "C", "HTS10"]);
    }
}

#[test]
fn test_column_survives_one_value() {
    let mut doc = Document::new();
    let mut last = sample();
    last.ZZ = "7".to_string();
    let root = doc.project_many(vec![sample(), sample(), last]).unwrap();
    for record in root.child_elements(&doc) {
        assert_eq!(
            field_names(&doc, record),
            vec!["A", "B", "C", "HTS10", "ZZ"]
        );
    }
}

#[test]
fn test_from_records_output() {
    let doc = Document::from_records(vec![sample()]).unwrap();
    assert!(doc.declaration().is_some());
    let xml = doc.to_xml_string().unwrap();
    assert_eq!(
        xml,
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
         <root>\r\n  \
         <record>\r\n    \
         <A type=\"String\">A</A>\r\n    \
         <B type=\"String\">B</B>\r\n    \
         <C type=\"String\">C</C>\r\n    \
         <HTS10 type=\"String\">0123456789</HTS10>\r\n  \
         </record>\r\n\
         </root>"
    );
}

#[test]
fn test_primitives_and_elements() {
    let mut doc = Document::new();
    let root = doc.project_many(vec![1, 2, 3]).unwrap();
    let values: Vec<String> = root
        .child_elements(&doc)
        .iter()
        .map(|record| record.value(&doc))
        .collect();
    assert_eq!(values, vec!["1", "2", "3"]);

    let attached = Element::build("item").text_content("x").finish(&mut doc);
    let holder = Element::new(&mut doc, "holder");
    holder
        .push_child(&mut doc, xml_records::Node::Element(attached))
        .unwrap();
    let detached = Element::build("item").text_content("y").finish(&mut doc);

    let root = doc.project_many(vec![attached, detached]).unwrap();
    let items = root.child_elements(&doc);
    assert_eq!(items.len(), 2);
    assert_ne!(items[0], attached);
    assert!(items[0].deep_eq(&doc, attached));
    assert_eq!(attached.parent(&doc), Some(holder));
    assert_eq!(items[1], detached);
    assert_eq!(detached.parent(&doc), Some(root));
}

#[test]
fn test_absent_value() {
    let mut doc = Document::new();
    let missing: Option<Sample> = None;
    assert!(matches!(
        doc.project(&missing),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        Document::from_records(vec![Some(sample()), None]),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_parallel_matches_sequential() {
    let samples: Vec<Sample> = (0..50)
        .map(|i| {
            let mut s = sample();
            s.A = format!("A{}", i);
            s
        })
        .collect();
    let mut doc = Document::new();
    let sequential = doc.project_many(&samples).unwrap();
    for threads in &[1, 3, 8, 64] {
        let parallel = doc.project_many_par(&samples, *threads).unwrap();
        assert!(parallel.deep_eq(&doc, sequential), "threads={}", threads);
    }
    let huge = doc.project_many_par(&samples, usize::MAX).unwrap();
    assert!(huge.deep_eq(&doc, sequential));
    let pair = doc.project_many_par(&[1, 2][..], usize::MAX).unwrap();
    assert_eq!(pair.child_elements(&doc).len(), 2);
    let empty: Vec<Sample> = Vec::new();
    let root = doc.project_many_par(&empty, 4).unwrap();
    assert!(!root.has_children(&doc));
}

trait Named {
    fn named_fields(&self) -> Vec<Field>;
}

trait Priced {
    fn priced_fields(&self) -> Vec<Field>;
}

struct Product {
    name: String,
    price: f64,
}

impl Named for Product {
    fn named_fields(&self) -> Vec<Field> {
        vec![Field::of("Name", &self.name)]
    }
}

impl Priced for Product {
    fn priced_fields(&self) -> Vec<Field> {
        vec![Field::of("Price", &self.price), Field::of("Name", &"shadowed")]
    }
}

impl Projectable for Product {
    fn shape(&self) -> Shape {
        Shape::Record(Field::union(vec![
            self.named_fields(),
            self.priced_fields(),
        ]))
    }
}

#[test]
fn test_capability_union() {
    let mut doc = Document::new();
    let product = Product {
        name: "bolt".to_string(),
        price: 0.25,
    };
    let record = doc.project(&product).unwrap();
    assert_eq!(field_names(&doc, record), vec!["Name", "Price"]);
    let name = record.find(&doc, "Name").unwrap();
    assert_eq!(name.value(&doc), "bolt");
    let price = record.find(&doc, "Price").unwrap();
    assert_eq!(price.attribute(&doc, "type"), Some("f64"));
    assert_eq!(TypeAnnotation::of::<f64>(), "f64");
}
