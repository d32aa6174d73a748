//! Positioned XML tree.
//!
//! A minimal element/attribute tree with exact byte spans, built on
//! `quick-xml`'s pull reader. The tree is tolerant of the states a document
//! is in while being edited:
//!
//! - mismatched end tags close whatever is open up to the matching name
//! - elements still open at end of input extend to the end of the text
//! - a hard reader error stops tree building but keeps everything before it
//!
//! Attribute spans are recovered by scanning the raw start tag, since the
//! reader only reports event boundaries.

use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use smol_str::SmolStr;

use crate::base::{LineIndex, TextRange, TextSize, TextSource};

/// An attribute with the spans of its name and (unquoted) value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XAttribute {
    pub name: SmolStr,
    pub name_range: TextRange,
    /// Raw value text between the quotes.
    pub value: SmolStr,
    /// Span of the value text, excluding quotes.
    pub value_range: TextRange,
    /// Whether a value (even an empty one) was written.
    pub has_value: bool,
    /// Span of the whole attribute.
    pub range: TextRange,
}

/// An element with its attributes and child elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XElement {
    pub name: SmolStr,
    pub name_range: TextRange,
    /// Span from `<` through the end tag (or end of input when unclosed).
    pub range: TextRange,
    /// Span of the start tag, `<` to `>`.
    pub start_tag_range: TextRange,
    /// Span between the start and end tags; `None` for self-closing elements.
    pub content_range: Option<TextRange>,
    pub attributes: Vec<XAttribute>,
    pub children: Vec<XElement>,
    pub is_self_closing: bool,
    /// Whether an end tag (or `/>`) was seen.
    pub is_closed: bool,
}

impl XElement {
    /// Find an attribute by name, ignoring ASCII case.
    pub fn attribute(&self, name: &str) -> Option<&XAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Child elements with the given name, ignoring ASCII case.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XElement> + 'a {
        self.children
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }

    /// Span of the element's text content, when it has no child elements.
    pub fn text_range(&self) -> Option<TextRange> {
        if self.children.is_empty() {
            self.content_range
        } else {
            None
        }
    }

    /// The child element whose span contains `offset`.
    fn child_at(&self, offset: TextSize) -> Option<&XElement> {
        self.children
            .iter()
            .find(|c| c.range.contains(offset) || (!c.is_closed && c.range.end() == offset))
    }
}

/// The element path from the root down to a caret, plus the attribute under it.
#[derive(Clone, Debug)]
pub struct XSpine<'a> {
    pub elements: Vec<&'a XElement>,
    pub attribute: Option<&'a XAttribute>,
}

impl<'a> XSpine<'a> {
    /// The innermost element.
    pub fn leaf(&self) -> Option<&'a XElement> {
        self.elements.last().copied()
    }
}

/// A parsed document: its text, root element and line index.
#[derive(Clone, Debug)]
pub struct XDocument {
    text: Arc<str>,
    root: Option<XElement>,
    line_index: LineIndex,
}

impl XDocument {
    /// Parse document text into a positioned tree.
    pub fn parse(text: impl Into<Arc<str>>) -> Self {
        let text: Arc<str> = text.into();
        let root = TreeBuilder::new(&text).build();
        let line_index = LineIndex::new(&text);
        Self {
            text,
            root,
            line_index,
        }
    }

    /// The first top-level element.
    pub fn root(&self) -> Option<&XElement> {
        self.root.as_ref()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Elements enclosing `offset`, outermost first, and the attribute under it.
    ///
    /// Attribute membership is end-inclusive so a caret right after the last
    /// character of a value still maps to that attribute.
    pub fn spine_at(&self, offset: TextSize) -> XSpine<'_> {
        let mut elements = Vec::new();
        let mut current = self.root.as_ref().filter(|r| r.range.contains_inclusive(offset));
        while let Some(el) = current {
            elements.push(el);
            current = el.child_at(offset);
        }
        let attribute = elements.last().and_then(|el| {
            el.attributes
                .iter()
                .find(|a| a.range.contains_inclusive(offset) || a.value_range.contains_inclusive(offset))
        });
        XSpine {
            elements,
            attribute,
        }
    }

    /// Depth-first, pre-order iteration over every element.
    pub fn elements(&self) -> Vec<&XElement> {
        fn push<'a>(el: &'a XElement, out: &mut Vec<&'a XElement>) {
            out.push(el);
            for child in &el.children {
                push(child, out);
            }
        }
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            push(root, &mut out);
        }
        out
    }
}

impl TextSource for XDocument {
    fn text(&self) -> &str {
        &self.text
    }
}

// ============================================================================
// TREE BUILDING
// ============================================================================

struct TreeBuilder<'t> {
    text: &'t str,
    stack: Vec<XElement>,
    root: Option<XElement>,
}

impl<'t> TreeBuilder<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            stack: Vec::new(),
            root: None,
        }
    }

    fn build(mut self) -> Option<XElement> {
        let mut reader = Reader::from_str(self.text);
        reader.config_mut().check_end_names = false;

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event();
            let end = reader.buffer_position() as usize;
            match event {
                Ok(Event::Start(_)) => {
                    let el = self.open_element(start, end, false);
                    self.stack.push(el);
                }
                Ok(Event::Empty(_)) => {
                    let el = self.open_element(start, end, true);
                    self.attach(el);
                }
                Ok(Event::End(_)) => {
                    let name = self.text[start..end]
                        .trim_start_matches("</")
                        .trim_end_matches('>')
                        .trim();
                    self.close_element(name, start, end);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!("xml reader stopped at {}: {}", reader.error_position(), err);
                    break;
                }
            }
            if self.root.is_some() && self.stack.is_empty() {
                break;
            }
        }

        // Anything still open runs to the end of the text.
        let text_end = TextSize::of(self.text);
        while let Some(mut el) = self.stack.pop() {
            el.range = TextRange::new(el.range.start(), text_end);
            el.content_range = Some(TextRange::new(el.start_tag_range.end(), text_end));
            self.attach(el);
        }
        self.root
    }

    fn attach(&mut self, el: XElement) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(el),
            None => {
                if self.root.is_none() {
                    self.root = Some(el);
                }
            }
        }
    }

    fn close_element(&mut self, name: &str, start: usize, end: usize) {
        let Some(depth) = self.stack.iter().rposition(|el| el.name == name) else {
            return;
        };
        // Implicitly close anything opened inside the matched element.
        while self.stack.len() > depth + 1 {
            if let Some(mut inner) = self.stack.pop() {
                let inner_end = TextSize::from(start as u32);
                inner.range = TextRange::new(inner.range.start(), inner_end);
                inner.content_range = Some(TextRange::new(inner.start_tag_range.end(), inner_end));
                self.attach(inner);
            }
        }
        if let Some(mut el) = self.stack.pop() {
            el.range = TextRange::new(el.range.start(), TextSize::from(end as u32));
            el.content_range = Some(TextRange::new(
                el.start_tag_range.end(),
                TextSize::from(start as u32),
            ));
            el.is_closed = true;
            self.attach(el);
        }
    }

    fn open_element(&self, start: usize, end: usize, self_closing: bool) -> XElement {
        let tag = &self.text[start..end];
        let bytes = tag.as_bytes();
        let mut pos = 1;
        let name_start = pos;
        while pos < bytes.len() && !is_tag_delimiter(bytes[pos]) {
            pos += 1;
        }
        let name = SmolStr::new(&tag[name_start..pos]);
        let at = |p: usize| TextSize::from((start + p) as u32);
        let name_range = TextRange::new(at(name_start), at(pos));
        let tag_range = TextRange::new(at(0), at(bytes.len()));
        let attributes = scan_attributes(tag, pos, start);

        XElement {
            name,
            name_range,
            range: tag_range,
            start_tag_range: tag_range,
            content_range: None,
            attributes,
            children: Vec::new(),
            is_self_closing: self_closing,
            is_closed: self_closing,
        }
    }
}

fn is_tag_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>' || b == b'='
}

/// Scan `name="value"` pairs from a raw start tag beginning at byte `pos`.
fn scan_attributes(tag: &str, mut pos: usize, base: usize) -> Vec<XAttribute> {
    let bytes = tag.as_bytes();
    let at = |p: usize| TextSize::from((base + p) as u32);
    let mut attributes = Vec::new();

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] == b'/' || bytes[pos] == b'>' {
            break;
        }
        let name_start = pos;
        while pos < bytes.len() && !is_tag_delimiter(bytes[pos]) {
            pos += 1;
        }
        if pos == name_start {
            // stray '='
            pos += 1;
            continue;
        }
        let name_end = pos;
        let mut scan = pos;
        while scan < bytes.len() && bytes[scan].is_ascii_whitespace() {
            scan += 1;
        }

        let (value_range, has_value, attr_end) = if scan < bytes.len() && bytes[scan] == b'=' {
            scan += 1;
            while scan < bytes.len() && bytes[scan].is_ascii_whitespace() {
                scan += 1;
            }
            match bytes.get(scan) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    let value_start = scan + 1;
                    let value_end = tag[value_start..]
                        .find(q as char)
                        .map(|i| value_start + i)
                        .unwrap_or_else(|| tag.trim_end_matches(['>', '/']).len().max(value_start));
                    let attr_end = (value_end + 1).min(bytes.len());
                    (TextRange::new(at(value_start), at(value_end)), true, attr_end)
                }
                _ => {
                    let value_start = scan;
                    while scan < bytes.len() && !is_tag_delimiter(bytes[scan]) {
                        scan += 1;
                    }
                    (TextRange::new(at(value_start), at(scan)), scan > value_start, scan)
                }
            }
        } else {
            (TextRange::empty(at(name_end)), false, name_end)
        };

        let value_local = usize::from(value_range.start()) - base..usize::from(value_range.end()) - base;
        attributes.push(XAttribute {
            name: SmolStr::new(&tag[name_start..name_end]),
            name_range: TextRange::new(at(name_start), at(name_end)),
            value: SmolStr::new(&tag[value_local]),
            value_range,
            has_value,
            range: TextRange::new(at(name_start), at(attr_end)),
        });
        pos = attr_end.max(name_end);
    }

    attributes
}
