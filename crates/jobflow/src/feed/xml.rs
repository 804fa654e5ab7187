use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::map::Entry;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseXmlError {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("document has no root element")]
    NoRoot,
    #[error("document ends inside <{0}>")]
    Truncated(String),
    #[error("unmatched closing tag </{0}>")]
    UnmatchedEnd(String),
}

/// Parse an XML document into a loosely-typed value tree.
///
/// The shape mirrors what upstream feed producers assume of permissive
/// XML-to-map parsers:
/// - an element with no attributes and no child elements becomes its text
///   content as a string (possibly empty),
/// - otherwise it becomes an object with attributes merged in as keys,
///   child elements keyed by name, and any text content under `"_"`,
/// - repeated sibling element names fold into an array, a single occurrence
///   stays scalar,
/// - CDATA folds into plain text,
/// - the document itself is an object keyed by the root element name.
pub fn xml_to_value(xml: &str) -> Result<Value, ParseXmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().expand_empty_elements = true;

    // Bottom frame stands in for the document; the root element lands in
    // its children.
    let mut stack = vec![Frame::new(String::new())];

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let mut frame = Frame::new(name);
                for attr in start.attributes() {
                    let attr = attr?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(quick_xml::Error::from)?
                        .into_owned();
                    frame.attrs.insert(key, Value::String(value));
                }
                stack.push(frame);
            }
            Event::End(end) => {
                let frame = stack.pop();
                match (frame, stack.last_mut()) {
                    (Some(frame), Some(parent)) => {
                        let (name, value) = frame.into_named_value();
                        parent.children.push((name, value));
                    }
                    _ => {
                        return Err(ParseXmlError::UnmatchedEnd(
                            String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                        ))
                    }
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(quick_xml::Error::from)?;
                if let Some(frame) = stack.last_mut() {
                    push_text(frame, &text);
                }
            }
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                if let Some(frame) = stack.last_mut() {
                    push_text(frame, &text);
                }
            }
            Event::Eof => break,
            // declarations, comments, doctypes, processing instructions
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack.pop().map(|frame| frame.name).unwrap_or_default();
        return Err(ParseXmlError::Truncated(open));
    }

    let (root_name, root_value) = stack
        .pop()
        .and_then(|document| document.children.into_iter().next())
        .ok_or(ParseXmlError::NoRoot)?;

    let mut doc = Map::new();
    doc.insert(root_name, root_value);
    Ok(Value::Object(doc))
}

struct Frame {
    name: String,
    attrs: Map<String, Value>,
    children: Vec<(String, Value)>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            attrs: Map::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn into_named_value(self) -> (String, Value) {
        let Frame {
            name,
            attrs,
            children,
            text,
        } = self;
        let text = text.trim().to_string();

        if attrs.is_empty() && children.is_empty() {
            return (name, Value::String(text));
        }

        let mut map = attrs;
        for (child_name, value) in children {
            match map.entry(child_name) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(mut slot) => match slot.get_mut() {
                    Value::Array(seq) => seq.push(value),
                    existing => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                },
            }
        }

        if !text.is_empty() {
            map.insert("_".to_string(), Value::String(text));
        }

        (name, Value::Object(map))
    }
}

fn push_text(frame: &mut Frame, text: &str) {
    if text.is_empty() {
        return;
    }
    if !frame.text.is_empty() {
        frame.text.push(' ');
    }
    frame.text.push_str(text);
}
