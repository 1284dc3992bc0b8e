//! XML → JSON conversion for feeds that are only published as XML.
//!
//! Conventions (namespace prefixes are dropped, only local names are kept):
//!
//! - an element with neither attributes nor children becomes its text as a string
//! - otherwise it becomes an object: attributes as `-name`, text as `#content`
//! - repeated child elements with the same name become an array

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::AppError;

struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<(String, Value)>,
    text: String,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, AppError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| AppError::parse(format!("bad attribute in <{name}>: {e}")))?;
            let key = attr.key;
            if key.as_ref() == b"xmlns" || key.prefix().is_some_and(|p| p.as_ref() == b"xmlns") {
                continue;
            }
            let key = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| AppError::parse(format!("bad attribute value in <{name}>: {e}")))?;
            attrs.push((key, value.into_owned()));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn into_value(self) -> (String, Value) {
        let text = self.text.trim().to_string();
        if self.attrs.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(text));
        }

        let mut obj = Map::new();
        for (k, v) in self.attrs {
            obj.insert(format!("-{k}"), Value::String(v));
        }
        for (k, v) in self.children {
            match obj.get_mut(&k) {
                Some(Value::Array(items)) => items.push(v),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, v]);
                }
                None => {
                    obj.insert(k, v);
                }
            }
        }
        if !text.is_empty() {
            obj.insert("#content".to_string(), Value::String(text));
        }
        (self.name, Value::Object(obj))
    }
}

/// Convert an XML document to a JSON value rooted at the document element.
pub fn xml_to_json(xml: &str) -> Result<Value, AppError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            AppError::parse(format!("malformed XML at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => stack.push(Node::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Node::open(&start)?.into_value();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| AppError::parse(format!("bad XML text: {e}")))?;
                    node.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| AppError::parse("unbalanced closing tag in XML"))?;
                let (name, value) = node.into_value();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(AppError::parse("unexpected end of XML document"));
    }
    let (name, value) = root.ok_or_else(|| AppError::parse("empty XML document"))?;
    let mut doc = Map::new();
    doc.insert(name, value);
    Ok(Value::Object(doc))
}

/// Convert to compact JSON bytes, the form stored in the cache.
pub fn xml_to_json_bytes(xml: &str) -> Result<Vec<u8>, AppError> {
    let value = xml_to_json(xml)?;
    serde_json::to_vec(&value).map_err(|e| AppError::parse(format!("failed to encode JSON: {e}")))
}

fn attach(stack: &mut [Node], root: &mut Option<(String, Value)>, name: String, value: Value) {
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, value)),
        None => *root = Some((name, value)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn converts_attributes_text_and_repeated_children() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:m="urn:m" xmlns:d="urn:d">
  <title type="text">DailyTreasuryYieldCurveRateData</title>
  <entry>
    <content type="application/xml">
      <m:properties>
        <d:NEW_DATE m:type="Edm.DateTime">2022-02-01T00:00:00</d:NEW_DATE>
        <d:BC_30YEARDISPLAY m:type="Edm.Double" m:null="true" />
      </m:properties>
    </content>
  </entry>
  <entry><id>second</id></entry>
</feed>"#;

        let v = xml_to_json(xml).unwrap();
        assert_eq!(
            v["feed"]["title"],
            json!({"-type": "text", "#content": "DailyTreasuryYieldCurveRateData"})
        );
        let entries = v["feed"]["entry"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        let props = &entries[0]["content"]["properties"];
        assert_eq!(
            props["NEW_DATE"],
            json!({"-type": "Edm.DateTime", "#content": "2022-02-01T00:00:00"})
        );
        assert_eq!(props["BC_30YEARDISPLAY"], json!({"-type": "Edm.Double", "-null": "true"}));
        assert_eq!(entries[1]["id"], json!("second"));
    }

    #[test]
    fn unescapes_entities_and_keeps_cdata_text() {
        let xml = r#"<root><a note="x &amp; y">R&amp;D</a><b><![CDATA[1 < 2]]></b></root>"#;
        let v = xml_to_json(xml).unwrap();
        assert_eq!(v["root"]["a"], json!({"-note": "x & y", "#content": "R&D"}));
        assert_eq!(v["root"]["b"], json!("1 < 2"));
    }

    #[test]
    fn rejects_truncated_documents() {
        assert!(xml_to_json("<feed><entry>").is_err());
        assert!(xml_to_json("").is_err());
    }
}
