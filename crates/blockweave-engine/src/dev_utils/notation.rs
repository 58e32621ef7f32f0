//! Reading and writing documents as markup.
//!
//! ```text
//! <paragraph listIndent="0" listItemId="a" listType="bulleted">a[]</paragraph>
//! <blockQuote><paragraph>quoted</paragraph></blockQuote>
//! ```
//!
//! The root element is implicit. An element holding child elements is a
//! container, anything else is a text block. Attributes are written sorted by
//! key; quoted values made of digits read back as integers and `true` or
//! `false` as booleans. `[]` marks a collapsed selection, `[` and `]` the two
//! ends of a range, either inside text or between elements.

use crate::dev_utils::lexer::{Token, TokenKind, lex};
use crate::model::element::byte_index;
use crate::model::{
    AttributeValue, Document, Element, Fragment, Model, ModelError, Path, Position, ROOT_NAME,
    Range,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("Unexpected `{found}` at byte {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("Unexpected end of input")]
    UnexpectedEnd,

    #[error("Closing tag `{found}` does not match open element `{expected}`")]
    MismatchedClose { expected: String, found: String },

    #[error("Element `{0}` is never closed")]
    Unclosed(String),

    #[error("Element `{0}` mixes text and child elements")]
    MixedContent(String),

    #[error("Unbalanced selection marker at byte {0}")]
    Selection(usize),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Parse markup into a document and the selection it marks, if any.
pub fn parse(markup: &str) -> Result<(Document, Option<Range>), NotationError> {
    let (children, selection) = parse_elements(markup)?;
    let document = Document::from_root(Element::container(ROOT_NAME, children));
    Ok((document, selection))
}

/// Parse markup into detached top-level elements.
pub fn parse_elements(markup: &str) -> Result<(Vec<Element>, Option<Range>), NotationError> {
    Parser::new(markup).run()
}

/// Parse markup as content to insert; selection markers are ignored.
pub fn parse_fragment(markup: &str) -> Result<Fragment, NotationError> {
    let (blocks, _) = parse_elements(markup)?;
    Ok(Fragment::new(blocks))
}

/// Write the document's content, marking `selection` when given.
pub fn stringify(document: &Document, selection: Option<&Range>) -> String {
    let mut out = String::new();
    write_content(&mut out, document.root(), &Vec::new(), selection);
    out
}

/// Write detached elements, such as a fragment's blocks.
pub fn stringify_elements(elements: &[Element]) -> String {
    let mut out = String::new();
    for (index, element) in elements.iter().enumerate() {
        write_element(&mut out, element, &vec![index], None);
    }
    out
}

/// Replace the model's content in one change session, so repair stages see
/// the new content as inserted. Returns the marked selection.
pub fn set_data(model: &mut Model, markup: &str) -> Result<Option<Range>, NotationError> {
    let (elements, selection) = parse_elements(markup)?;
    model.change(|writer| {
        let count = writer.document().root().children.len();
        writer.remove_range(&[], 0..count)?;
        writer.insert(Position::in_root(0), elements)
    })?;
    Ok(selection)
}

pub fn get_data(model: &Model, selection: Option<&Range>) -> String {
    stringify(model.document(), selection)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Start,
    End,
}

/// Selection marker seen inside an open element, resolved when the element
/// closes and is known to be a container or a text block.
struct Marker {
    end: End,
    chars: usize,
    children: usize,
}

struct Open {
    element: Element,
    path: Path,
    text: String,
    raw: String,
    markers: Vec<Marker>,
}

impl Open {
    fn new(element: Element, path: Path) -> Self {
        Self {
            element,
            path,
            text: String::new(),
            raw: String::new(),
            markers: Vec::new(),
        }
    }

    fn flush(&mut self) {
        if !self.raw.is_empty() {
            self.text.push_str(&html_escape::decode_html_entities(&self.raw));
            self.raw.clear();
        }
    }
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    cursor: usize,
    stack: Vec<Open>,
    start: Option<Position>,
    end: Option<Position>,
    markers_seen: usize,
}

impl<'a> Parser<'a> {
    fn new(markup: &'a str) -> Self {
        Self {
            tokens: lex(markup),
            cursor: 0,
            stack: vec![Open::new(Element::new(ROOT_NAME), Vec::new())],
            start: None,
            end: None,
            markers_seen: 0,
        }
    }

    fn run(mut self) -> Result<(Vec<Element>, Option<Range>), NotationError> {
        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Lt => self.open_tag()?,
                TokenKind::LtSlash => self.close_tag()?,
                TokenKind::LBracket => self.marker(End::Start, token.offset)?,
                TokenKind::RBracket => self.marker(End::End, token.offset)?,
                _ => self.top().raw.push_str(token.text),
            }
        }

        if self.stack.len() > 1 {
            let name = self.top().element.name.clone();
            return Err(NotationError::Unclosed(name));
        }
        let root = self.close()?;
        let selection = match (self.start, self.end) {
            (None, None) => None,
            (Some(start), Some(end)) => Some(Range::new(start, end)),
            _ => return Err(NotationError::Selection(0)),
        };
        Ok((root.children, selection))
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.cursor).cloned();
        self.cursor += 1;
        token
    }

    /// Next token that is not whitespace.
    fn next_significant(&mut self) -> Result<Token<'a>, NotationError> {
        loop {
            let token = self.next().ok_or(NotationError::UnexpectedEnd)?;
            if token.kind != TokenKind::Whitespace {
                return Ok(token);
            }
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, NotationError> {
        let token = self.next_significant()?;
        if token.kind != kind {
            return Err(unexpected(&token));
        }
        Ok(token)
    }

    fn top(&mut self) -> &mut Open {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn open_tag(&mut self) -> Result<(), NotationError> {
        self.top().flush();
        let name = self.expect(TokenKind::Name)?;
        let mut element = Element::new(name.text);
        let empty = loop {
            let token = self.next_significant()?;
            match token.kind {
                TokenKind::Gt => break false,
                TokenKind::SlashGt => break true,
                TokenKind::Name => {
                    self.expect(TokenKind::Eq)?;
                    let value = self.expect(TokenKind::Quoted)?;
                    element
                        .attributes
                        .insert(token.text.to_string(), attribute_value(value.text));
                }
                _ => return Err(unexpected(&token)),
            }
        };

        let parent = self.top();
        let mut path = parent.path.clone();
        path.push(parent.element.children.len());
        self.stack.push(Open::new(element, path));
        if empty {
            let element = self.close()?;
            self.top().element.children.push(element);
        }
        Ok(())
    }

    fn close_tag(&mut self) -> Result<(), NotationError> {
        self.top().flush();
        let name = self.expect(TokenKind::Name)?;
        self.expect(TokenKind::Gt)?;
        let expected = self.top().element.name.clone();
        if self.stack.len() == 1 || expected != name.text {
            return Err(NotationError::MismatchedClose {
                expected,
                found: name.text.to_string(),
            });
        }
        let element = self.close()?;
        self.top().element.children.push(element);
        Ok(())
    }

    fn marker(&mut self, end: End, offset: usize) -> Result<(), NotationError> {
        let expected = if self.markers_seen == 0 { End::Start } else { End::End };
        if end != expected || self.markers_seen > 1 {
            return Err(NotationError::Selection(offset));
        }
        self.markers_seen += 1;

        let open = self.top();
        open.flush();
        let marker = Marker {
            end,
            chars: open.text.chars().count(),
            children: open.element.children.len(),
        };
        open.markers.push(marker);
        Ok(())
    }

    /// Pop the innermost open element, settling its content and markers.
    fn close(&mut self) -> Result<Element, NotationError> {
        let Some(mut open) = self.stack.pop() else {
            return Err(NotationError::UnexpectedEnd);
        };
        open.flush();
        let is_container = !open.element.children.is_empty() || open.path.is_empty();
        if is_container {
            if !open.text.trim().is_empty() {
                return Err(NotationError::MixedContent(open.element.name));
            }
        } else {
            open.element.text = std::mem::take(&mut open.text);
        }

        for marker in &open.markers {
            let offset = if is_container { marker.children } else { marker.chars };
            let position = Position::new(open.path.clone(), offset);
            match marker.end {
                End::Start => self.start = Some(position),
                End::End => self.end = Some(position),
            }
        }
        Ok(open.element)
    }
}

fn unexpected(token: &Token<'_>) -> NotationError {
    NotationError::UnexpectedToken {
        found: token.text.to_string(),
        offset: token.offset,
    }
}

fn attribute_value(quoted: &str) -> AttributeValue {
    let inner = &quoted[1..quoted.len() - 1];
    let value = html_escape::decode_html_entities(inner);
    let digits = value.strip_prefix('-').unwrap_or(value.as_ref());
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = value.parse() {
            return AttributeValue::Int(n);
        }
    }
    if value == "true" || value == "false" {
        return AttributeValue::Bool(value == "true");
    }
    AttributeValue::Str(value.into_owned())
}

fn escape_text(text: &str) -> String {
    html_escape::encode_text(text)
        .replace('[', "&#91;")
        .replace(']', "&#93;")
}

/// Marker text for `offset` inside the element at `path`.
fn marks(selection: Option<&Range>, path: &Path, offset: usize) -> &'static str {
    let Some(range) = selection else {
        return "";
    };
    let at = |position: &Position| &position.parent == path && position.offset == offset;
    match (at(&range.start), at(&range.end)) {
        (true, true) => "[]",
        (true, false) => "[",
        (false, true) => "]",
        (false, false) => "",
    }
}

fn write_content(out: &mut String, element: &Element, path: &Path, selection: Option<&Range>) {
    if element.children.is_empty() {
        write_text(out, &element.text, path, selection);
        return;
    }
    for (index, child) in element.children.iter().enumerate() {
        out.push_str(marks(selection, path, index));
        let mut child_path = path.clone();
        child_path.push(index);
        write_element(out, child, &child_path, selection);
    }
    out.push_str(marks(selection, path, element.children.len()));
}

fn write_element(out: &mut String, element: &Element, path: &Path, selection: Option<&Range>) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        let value = value.to_string();
        out.push_str(&format!(
            " {key}=\"{}\"",
            html_escape::encode_double_quoted_attribute(&value)
        ));
    }
    out.push('>');
    write_content(out, element, path, selection);
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_text(out: &mut String, text: &str, path: &Path, selection: Option<&Range>) {
    let mut cuts: Vec<usize> = selection
        .into_iter()
        .flat_map(|range| [&range.start, &range.end])
        .filter(|position| &position.parent == path)
        .map(|position| position.offset)
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut rest = text;
    let mut consumed = 0;
    for cut in cuts {
        let at = byte_index(rest, cut.saturating_sub(consumed)).unwrap_or(rest.len());
        let (head, tail) = rest.split_at(at);
        out.push_str(&escape_text(head));
        out.push_str(marks(selection, path, cut));
        rest = tail;
        consumed = cut;
    }
    out.push_str(&escape_text(rest));
}
