// Generic XML decoding into attribute bags.
//
// One REST generation of the backend answered in XML with no published
// schema. Rather than typing it, each child of the root element becomes a
// JSON object keyed by child tag:
//   - element with text          -> string
//   - empty leaf element         -> null
//   - element with child elements -> array of nested bags (repeats accumulate)

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

#[derive(Debug, Default)]
struct Element {
    tag: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Self {
        Self {
            tag: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            ..Self::default()
        }
    }
}

/// Decode `xml` into a JSON array with one bag per child of the root.
pub fn deserialize(xml: &str) -> Result<Value, String> {
    let root = parse_tree(xml)?;
    Ok(Value::Array(root.children.iter().map(bag).collect()))
}

fn bag(node: &Element) -> Value {
    let mut fields = Map::new();
    for child in &node.children {
        if !child.text.is_empty() {
            fields.insert(child.tag.clone(), Value::String(child.text.clone()));
        } else if child.children.is_empty() {
            fields.insert(child.tag.clone(), Value::Null);
        } else {
            let entry = fields
                .entry(child.tag.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !entry.is_array() {
                *entry = Value::Array(Vec::new());
            }
            if let Value::Array(items) = entry {
                items.push(bag(child));
            }
        }
    }
    Value::Object(fields)
}

fn parse_tree(xml: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(start) => stack.push(Element::open(&start)),
            Event::Empty(start) => {
                let leaf = Element::open(&start);
                attach(&mut stack, &mut root, leaf);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text.unescape().map_err(|e| e.to_string())?;
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let done = stack.pop().ok_or("unbalanced closing tag")?;
                attach(&mut stack, &mut root, done);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of document".into());
    }
    root.ok_or_else(|| "document has no root element".into())
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}
