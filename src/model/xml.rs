//! A small owned element tree built on top of `quick_xml::NsReader`.
//!
//! Manifests are tiny, and the lookups we need (`find`, `findall`, descendant search)
//! are much easier to express over a tree than over the raw event stream.
//! Only elements and attributes are kept. Text is checked (entities must resolve, nothing but
//! whitespace outside the root) and then dropped, as are comments and processing instructions.

use log::trace;
use quick_xml::NsReader;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use std::io::BufRead;
use std::str::Utf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlTreeError {
    #[error("at position {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("at position {position}: malformed attribute: {source}")]
    Attribute {
        position: u64,
        #[source]
        source: AttrError,
    },

    #[error("invalid UTF-8 in a name: {0}")]
    Utf8(#[from] Utf8Error),

    #[error("unbound prefix `{prefix}`")]
    UnboundPrefix { prefix: String },

    #[error("no element found")]
    NoRootElement,

    #[error("element <{name}> is not closed at end of input")]
    UnclosedElement { name: String },

    #[error("junk after document element: <{name}>")]
    TrailingElement { name: String },

    #[error("at position {position}: text outside the document element")]
    TextOutsideRoot { position: u64 },
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Reads a whole document and returns its root element.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<XmlElement, XmlTreeError> {
        let mut reader = NsReader::from_reader(reader);
        let mut buf = Vec::new();

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|source| XmlTreeError::Xml {
                    position: reader.error_position() as u64,
                    source,
                })?;

            match event {
                Event::Start(start) => {
                    let element = open_element(&reader, &start)?;
                    if stack.is_empty() && root.is_some() {
                        return Err(XmlTreeError::TrailingElement { name: element.name });
                    }
                    trace!("open <{}> at depth {}", element.name, stack.len());
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = open_element(&reader, &start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    // `NsReader` already verified that the end tag matches the open one.
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element)?;
                    }
                }
                Event::Text(text) => {
                    if stack.is_empty() {
                        if !text.iter().all(u8::is_ascii_whitespace) {
                            return Err(XmlTreeError::TextOutsideRoot {
                                position: reader.buffer_position() as u64,
                            });
                        }
                    } else {
                        // Unknown entities only surface when the text is unescaped.
                        text.unescape().map_err(|source| XmlTreeError::Xml {
                            position: reader.buffer_position() as u64,
                            source,
                        })?;
                    }
                }
                Event::CData(_) if stack.is_empty() => {
                    return Err(XmlTreeError::TextOutsideRoot {
                        position: reader.buffer_position() as u64,
                    });
                }
                Event::Eof => break,
                _ => {}
            }

            buf.clear();
        }

        if let Some(open) = stack.pop() {
            return Err(XmlTreeError::UnclosedElement { name: open.name });
        }

        root.ok_or(XmlTreeError::NoRootElement)
    }

    pub fn parse_str(text: &str) -> Result<XmlElement, XmlTreeError> {
        XmlElement::from_reader(text.as_bytes())
    }

    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Value of an unprefixed attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.is_none() && attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// First direct child with the given qualified name.
    pub fn child(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// All direct children with the given qualified name, in document order.
    pub fn children_named<'s>(
        &'s self,
        namespace: &'s str,
        name: &'s str,
    ) -> impl Iterator<Item = &'s XmlElement> + 's {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// First descendant (not including `self`) with the given qualified name, in document order.
    pub fn descendant(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.is(namespace, name) {
                return Some(child);
            }
            if let Some(found) = child.descendant(namespace, name) {
                return Some(found);
            }
        }

        None
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlTreeError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(XmlTreeError::TrailingElement { name: element.name });
        }
        None => *root = Some(element),
    }

    Ok(())
}

fn open_element<R>(reader: &NsReader<R>, start: &BytesStart) -> Result<XmlElement, XmlTreeError> {
    let (ns, local) = reader.resolve_element(start.name());
    let namespace = namespace_uri(ns)?;
    let name = std::str::from_utf8(local.into_inner())?.to_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|source| XmlTreeError::Attribute {
            position: reader.buffer_position() as u64,
            source,
        })?;

        // `xmlns` declarations are consumed by the namespace resolver, not exposed.
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }

        let (ns, local) = reader.resolve_attribute(attr.key);
        let namespace = namespace_uri(ns)?;
        let name = std::str::from_utf8(local.into_inner())?.to_owned();
        let value = attr
            .unescape_value()
            .map_err(|source| XmlTreeError::Xml {
                position: reader.buffer_position() as u64,
                source,
            })?
            .into_owned();

        attributes.push(XmlAttribute {
            namespace,
            name,
            value,
        });
    }

    Ok(XmlElement {
        namespace,
        name,
        attributes,
        children: Vec::new(),
    })
}

fn namespace_uri(result: ResolveResult<'_>) -> Result<Option<String>, XmlTreeError> {
    match result {
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Bound(ns) => Ok(Some(std::str::from_utf8(ns.into_inner())?.to_owned())),
        ResolveResult::Unknown(prefix) => Err(XmlTreeError::UnboundPrefix {
            prefix: String::from_utf8_lossy(&prefix).into_owned(),
        }),
    }
}
