// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Minimal XML document model used for MQ request and response bodies.

use mqkit_core::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Text content of an element.
///
/// Elements that carry attributes keep them next to their text so that
/// nothing in the document is lost, while [`XmlText::value`] gives the text
/// alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlText {
    /// Text of an element without attributes.
    Plain(String),
    /// Text of an element that carries attributes.
    Attributed {
        /// The text content.
        text: String,
        /// Attributes in document order.
        attributes: Vec<(String, String)>,
    },
}

impl XmlText {
    /// The text content, ignoring any attributes.
    pub fn value(&self) -> &str {
        match self {
            XmlText::Plain(text) => text,
            XmlText::Attributed { text, .. } => text,
        }
    }

    /// Consume self and return the text content.
    pub fn into_value(self) -> String {
        match self {
            XmlText::Plain(text) => text,
            XmlText::Attributed { text, .. } => text,
        }
    }
}

/// An element of a parsed (or to be written) XML document.
///
/// Names are stored without namespace prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create an element that only holds text.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    /// Set the text of this element.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Append a child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First child named `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children named `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of this element.
    pub fn text(&self) -> XmlText {
        if self.attributes.is_empty() {
            XmlText::Plain(self.text.clone())
        } else {
            XmlText::Attributed {
                text: self.text.clone(),
                attributes: self.attributes.clone(),
            }
        }
    }

    /// Text of the first child named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Flatten the children of this element into a name to text mapping.
    ///
    /// Attributes are dropped. If a name repeats, the first one wins.
    pub fn fields(&self) -> Fields {
        let mut fields = BTreeMap::new();
        for child in &self.children {
            fields
                .entry(child.name.clone())
                .or_insert_with(|| child.text().into_value());
        }
        Fields {
            element: self.name.clone(),
            fields,
        }
    }

    /// Parse a document and return its root element.
    pub fn parse(input: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(input);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::unexpected(format!(
                    "failed to parse xml at position {}",
                    reader.buffer_position()
                ))
                .with_source(e)
            })?;

            match event {
                Event::Start(e) => stack.push(Self::from_start(&e)?),
                Event::Empty(e) => {
                    let element = Self::from_start(&e)?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let Some(mut element) = stack.pop() else {
                        return Err(Error::unexpected("unbalanced xml end tag"));
                    };
                    if !element.children.is_empty() && element.text.trim().is_empty() {
                        element.text.clear();
                    }
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|e| {
                        Error::unexpected("failed to unescape xml text").with_source(e)
                    })?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text);
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8(e.into_inner().into_owned())?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text);
                    }
                }
                Event::Eof => break,
                // Declarations, comments and processing instructions carry no data.
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::unexpected("xml document ended inside an element"));
        }
        root.ok_or_else(|| Error::unexpected("xml document has no root element"))
    }

    fn from_start(e: &BytesStart) -> Result<XmlElement> {
        let name = String::from_utf8(e.local_name().as_ref().to_vec())?;
        let mut element = XmlElement::new(name);
        for attr in e.attributes() {
            let attr = attr
                .map_err(|e| Error::unexpected("invalid xml attribute").with_source(e))?;
            let key = String::from_utf8(attr.key.local_name().as_ref().to_vec())?;
            let value = attr
                .unescape_value()
                .map_err(|e| Error::unexpected("invalid xml attribute value").with_source(e))?;
            element.attributes.push((key, value.into_owned()));
        }
        Ok(element)
    }

    fn attach(
        stack: &mut [XmlElement],
        root: &mut Option<XmlElement>,
        element: XmlElement,
    ) -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => *root = Some(element),
            None => return Err(Error::unexpected("xml document has multiple roots")),
        }
        Ok(())
    }

    /// Serialize this element as a complete document with an XML declaration.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| Error::unexpected("failed to write xml").with_source(e))?;
        self.write_to(&mut writer)?;
        Ok(writer.into_inner())
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        let write = |writer: &mut Writer<Vec<u8>>, event: Event| {
            writer
                .write_event(event)
                .map_err(|e| Error::unexpected("failed to write xml").with_source(e))
        };

        write(writer, Event::Start(start))?;
        if !self.text.is_empty() {
            write(writer, Event::Text(BytesText::new(&self.text)))?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        write(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

/// Flat mapping of an element's children to their text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    element: String,
    fields: BTreeMap<String, String>,
}

impl Fields {
    /// Text of field `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Text of field `name`, failing if the field is absent.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            Error::unexpected(format!(
                "field {name} is missing in element {}",
                self.element
            ))
        })
    }

    /// Parse field `name` into `T` if present.
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.get(name)
            .map(|v| {
                v.trim().parse::<T>().map_err(|e| {
                    Error::unexpected(format!("field {name} has invalid value {v}")).with_source(e)
                })
            })
            .transpose()
    }

    /// Iterate over all fields sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Consume self and return the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.fields
    }
}
