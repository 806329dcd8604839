//! Typed read access to OCS response bodies.
//!
//! # Design
//! The normalizer only ever needs two lookups: "string at this path" and
//! "integer at this path". `OcsDocument` captures exactly that, and each body
//! format implements it once. Lookups never fail; a missing or mistyped node
//! is simply `None`, which lets the caller fall through to the next source.
//!
//! XML paths use raw qualified element names (`d:error`, `s:message`), since
//! the server always emits the same prefixes for these envelopes.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;

use crate::error::DocumentError;

/// `ocs.meta.statuscode`
pub const OCS_META_CODE: &[&str] = &["ocs", "meta", "statuscode"];
/// `ocs.meta.message`
pub const OCS_META_MESSAGE: &[&str] = &["ocs", "meta", "message"];
/// `ocs.data.message`
pub const OCS_DATA_MESSAGE: &[&str] = &["ocs", "data", "message"];
/// `d:error.s:message`, the sabre/dav exception body.
pub const DAV_ERROR_MESSAGE: &[&str] = &["d:error", "s:message"];

/// Path-based lookups over a parsed response body.
pub trait OcsDocument {
    fn get_string(&self, path: &[&str]) -> Option<String>;
    fn get_int(&self, path: &[&str]) -> Option<i64>;
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// A JSON response body.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    root: Value,
}

impl JsonDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(Self::new(serde_json::from_slice(bytes)?))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.root, |node, key| node.get(*key))
    }
}

impl OcsDocument for JsonDocument {
    fn get_string(&self, path: &[&str]) -> Option<String> {
        self.lookup(path)?.as_str().map(str::to_string)
    }

    fn get_int(&self, path: &[&str]) -> Option<i64> {
        let node = self.lookup(path)?;
        node.as_i64().or_else(|| node.as_f64().map(|f| f as i64))
    }
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// An XML response body reduced to an element tree.
///
/// Only element names, character data and nesting are kept. Attributes and
/// namespace URIs are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlDocument {
    root: Option<XmlElement>,
}

impl XmlDocument {
    /// Parse `bytes`, yielding an empty document if they are not well-formed
    /// XML. Every lookup on an empty document returns `None`.
    pub fn parse(bytes: &[u8]) -> Self {
        Self::try_parse(bytes).unwrap_or_default()
    }

    pub fn try_parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(XmlElement::named(e.name().as_ref())),
                Event::Empty(e) => attach(&mut stack, &mut root, XmlElement::named(e.name().as_ref())),
                Event::Text(e) => {
                    if let Some(top) = stack.last_mut() {
                        let text = e.unescape().map_err(quick_xml::Error::from)?;
                        top.text.push_str(&text);
                    }
                }
                Event::CData(e) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(std::str::from_utf8(&e.into_inner())?);
                    }
                }
                Event::End(_) => {
                    if let Some(done) = stack.pop() {
                        attach(&mut stack, &mut root, done);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(DocumentError::UnclosedElement(stack.remove(0).name));
        }
        if root.is_none() {
            return Err(DocumentError::NoRootElement);
        }
        Ok(Self { root })
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn lookup(&self, path: &[&str]) -> Option<&XmlElement> {
        let (first, rest) = path.split_first()?;
        let root = self.root.as_ref().filter(|r| r.name == *first)?;
        rest.iter().try_fold(root, |node, name| node.child(name))
    }

    /// Text of the element at `path`, including empty text.
    pub fn text(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path).map(|e| e.text.as_str())
    }
}

/// Hand a finished element to its parent, or make it the root. Anything
/// after the first root element is ignored.
fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

impl OcsDocument for XmlDocument {
    fn get_string(&self, path: &[&str]) -> Option<String> {
        self.text(path)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    fn get_int(&self, path: &[&str]) -> Option<i64> {
        self.text(path)?.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_lookups() {
        let doc = JsonDocument::new(json!({
            "ocs": {
                "meta": {"statuscode": 404, "message": "gone"},
                "data": {"message": ""}
            }
        }));
        assert_eq!(doc.get_int(OCS_META_CODE), Some(404));
        assert_eq!(doc.get_string(OCS_META_MESSAGE).as_deref(), Some("gone"));
        assert_eq!(doc.get_string(OCS_DATA_MESSAGE).as_deref(), Some(""));
        assert_eq!(doc.get_string(&["ocs", "missing"]), None);
    }

    #[test]
    fn json_type_mismatch_is_none() {
        let doc = JsonDocument::new(json!({
            "ocs": {"meta": {"statuscode": "404", "message": 7}}
        }));
        assert_eq!(doc.get_int(OCS_META_CODE), None);
        assert_eq!(doc.get_string(OCS_META_MESSAGE), None);
    }

    #[test]
    fn json_float_status_is_truncated() {
        let doc = JsonDocument::new(json!({"ocs": {"meta": {"statuscode": 200.0}}}));
        assert_eq!(doc.get_int(OCS_META_CODE), Some(200));
    }

    #[test]
    fn json_path_through_array_is_none() {
        let doc = JsonDocument::new(json!({"ocs": []}));
        assert_eq!(doc.get_int(OCS_META_CODE), None);
    }

    #[test]
    fn json_parse_rejects_garbage() {
        assert!(JsonDocument::parse(b"<ocs/>").is_err());
    }

    #[test]
    fn xml_ocs_lookups() {
        let doc = XmlDocument::parse(
            br#"<?xml version="1.0"?>
            <ocs>
              <meta>
                <status>failure</status>
                <statuscode> 997 </statuscode>
                <message>Unauthorised</message>
              </meta>
              <data/>
            </ocs>"#,
        );
        assert_eq!(doc.get_int(OCS_META_CODE), Some(997));
        assert_eq!(doc.get_string(OCS_META_MESSAGE).as_deref(), Some("Unauthorised"));
        assert_eq!(doc.get_string(OCS_DATA_MESSAGE), None);
    }

    #[test]
    fn xml_dav_error_uses_prefixed_names() {
        let doc = XmlDocument::parse(
            br#"<?xml version="1.0" encoding="utf-8"?>
            <d:error xmlns:d="DAV:" xmlns:s="http://sabredav.org/ns">
              <s:exception>Sabre\DAV\Exception\Locked</s:exception>
              <s:message>Locked</s:message>
            </d:error>"#,
        );
        assert_eq!(doc.get_string(DAV_ERROR_MESSAGE).as_deref(), Some("Locked"));
        assert_eq!(doc.get_string(&["error", "message"]), None);
    }

    #[test]
    fn xml_unescapes_entities_and_reads_cdata() {
        let doc = XmlDocument::parse(
            b"<ocs><meta><message>a &amp; b</message></meta><data><message><![CDATA[<raw>]]></message></data></ocs>",
        );
        assert_eq!(doc.get_string(OCS_META_MESSAGE).as_deref(), Some("a & b"));
        assert_eq!(doc.get_string(OCS_DATA_MESSAGE).as_deref(), Some("<raw>"));
    }

    #[test]
    fn xml_first_matching_child_wins() {
        let doc = XmlDocument::parse(b"<ocs><meta><message>one</message><message>two</message></meta></ocs>");
        assert_eq!(doc.get_string(OCS_META_MESSAGE).as_deref(), Some("one"));
    }

    #[test]
    fn xml_empty_text_is_not_a_string() {
        let doc = XmlDocument::parse(b"<ocs><meta><message></message></meta></ocs>");
        assert_eq!(doc.text(OCS_META_MESSAGE), Some(""));
        assert_eq!(doc.get_string(OCS_META_MESSAGE), None);
    }

    #[test]
    fn xml_garbage_is_empty_document() {
        for body in [&b"not xml at all"[..], b"", b"<ocs><meta>", b"<a></b>"] {
            let doc = XmlDocument::parse(body);
            assert!(doc.is_empty(), "{:?}", String::from_utf8_lossy(body));
            assert_eq!(doc.get_int(OCS_META_CODE), None);
        }
    }

    #[test]
    fn xml_try_parse_reports_failures() {
        assert!(matches!(
            XmlDocument::try_parse(b"<ocs><meta>"),
            Err(DocumentError::UnclosedElement(name)) if name == "ocs"
        ));
        assert!(matches!(XmlDocument::try_parse(b"plain"), Err(DocumentError::NoRootElement)));
        assert!(matches!(XmlDocument::try_parse(b"<a></b>"), Err(DocumentError::Xml(_))));
    }
}
