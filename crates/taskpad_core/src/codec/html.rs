//! HTML codec for initial content and host synchronization.
//!
//! # Responsibility
//! - Parse host-provided HTML into a schema-valid document.
//! - Serialize documents back to the same HTML dialect.
//!
//! # Invariants
//! - `<p>` ↔ paragraph, `<ul data-type="taskList">` ↔ task list,
//!   `<li data-type="taskItem" data-done="…">` ↔ task item.
//! - Unknown elements are transparent; their content is parsed in place.
//! - A parse result is never empty: no blocks yields `doc(paragraph())`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::node::builders::{empty_doc, task_list};
use crate::model::node::{Node, TaskItemAttrs};
use crate::model::schema::{check_document, SchemaError};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<![^>]*>|<(/?)([A-Za-z][A-Za-z0-9-]*)([^>]*)>|[^<]+|<")
        .expect("valid html token regex")
});
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+)))?"#)
        .expect("valid html attribute regex")
});
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]+);").expect("valid entity regex")
});
// ASCII whitespace only; U+00A0 is content.
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\r\n\x0C]+").expect("valid ws regex"));
static OPEN_TAG_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:/?[A-Za-z]|!)").expect("valid tag start regex"));

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];
const INLINE_TAGS: &[&str] = &[
    "a", "b", "br", "code", "em", "i", "input", "label", "mark", "s", "small", "span", "strong",
    "sub", "sup", "u", "wbr",
];

/// Errors from parsing HTML content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlParseError {
    /// A `<name` or `</name` is cut off by the end of input.
    UnterminatedTag { offset: usize },
    /// Parsed content does not form a legal document.
    Schema(SchemaError),
}

impl Display for HtmlParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnterminatedTag { offset } => {
                write!(f, "unterminated tag at byte offset {offset}")
            }
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HtmlParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::UnterminatedTag { .. } => None,
        }
    }
}

impl From<SchemaError> for HtmlParseError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

/// Loosely parsed element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Markup {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Markup>,
    },
    Text(String),
}

impl Markup {
    fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Markup::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            Markup::Text(_) => None,
        }
    }

    fn raw_text(&self, out: &mut String) {
        match self {
            Markup::Text(text) => out.push_str(text),
            Markup::Element { tag, children, .. } => {
                if tag == "br" {
                    out.push(' ');
                }
                for child in children {
                    child.raw_text(out);
                }
            }
        }
    }
}

/// Parses HTML into a validated document.
///
/// # Errors
/// - `UnterminatedTag` when a tag is left open at the end of input.
/// - `Schema` when the converted tree is illegal.
pub fn parse_html(input: &str) -> Result<Node, HtmlParseError> {
    let roots = build_tree(input)?;
    let mut blocks = Vec::new();
    collect_blocks(&roots, &mut blocks);
    if blocks.is_empty() {
        return Ok(empty_doc());
    }
    let document = Node::Doc { content: blocks };
    check_document(&document)?;
    Ok(document)
}

fn build_tree(input: &str) -> Result<Vec<Markup>, HtmlParseError> {
    // Stack of open elements; index 0 is a synthetic root.
    let mut stack: Vec<(String, Vec<(String, String)>, Vec<Markup>)> =
        vec![(String::new(), Vec::new(), Vec::new())];
    for token in TOKEN_RE.captures_iter(input) {
        let Some(whole) = token.get(0) else {
            continue;
        };

        let Some(name) = token.get(2) else {
            let raw = whole.as_str();
            if raw == "<" {
                // A lone `<` is text unless it opens a tag with no closing `>`.
                if OPEN_TAG_START_RE.is_match(&input[whole.end()..]) {
                    return Err(HtmlParseError::UnterminatedTag {
                        offset: whole.start(),
                    });
                }
                push_child(&mut stack, Markup::Text(raw.to_string()));
            } else if !raw.starts_with('<') {
                push_child(&mut stack, Markup::Text(raw.to_string()));
            }
            continue;
        };
        let tag = name.as_str().to_ascii_lowercase();
        let closing = token.get(1).is_some_and(|slash| !slash.as_str().is_empty());
        let attr_source = token.get(3).map(|m| m.as_str()).unwrap_or_default();

        if closing {
            close_element(&mut stack, &tag);
            continue;
        }
        let attrs = parse_attrs(attr_source);
        let self_closing = attr_source.trim_end().ends_with('/');
        if self_closing || VOID_TAGS.contains(&tag.as_str()) {
            push_child(
                &mut stack,
                Markup::Element {
                    tag,
                    attrs,
                    children: Vec::new(),
                },
            );
        } else {
            stack.push((tag, attrs, Vec::new()));
        }
    }
    while stack.len() > 1 {
        pop_element(&mut stack);
    }
    Ok(stack.pop().map(|(_, _, children)| children).unwrap_or_default())
}

fn push_child(stack: &mut [(String, Vec<(String, String)>, Vec<Markup>)], child: Markup) {
    if let Some((_, _, children)) = stack.last_mut() {
        children.push(child);
    }
}

fn pop_element(stack: &mut Vec<(String, Vec<(String, String)>, Vec<Markup>)>) {
    if stack.len() <= 1 {
        return;
    }
    if let Some((tag, attrs, children)) = stack.pop() {
        push_child(
            stack,
            Markup::Element {
                tag,
                attrs,
                children,
            },
        );
    }
}

/// Closes the nearest open `tag`, implicitly closing anything opened after
/// it. Stray closing tags are ignored.
fn close_element(stack: &mut Vec<(String, Vec<(String, String)>, Vec<Markup>)>, tag: &str) {
    let Some(depth) = stack.iter().skip(1).rposition(|(open, _, _)| open == tag) else {
        return;
    };
    let target_len = depth + 1;
    while stack.len() > target_len {
        pop_element(stack);
    }
}

fn parse_attrs(source: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

fn decode_entities(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, |caps: &Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(decimal) = body.strip_prefix('#') {
                decimal.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn normalized_text(nodes: &[Markup]) -> String {
    let mut raw = String::new();
    for node in nodes {
        node.raw_text(&mut raw);
    }
    // Collapse before decoding so escaped whitespace survives.
    let collapsed = WHITESPACE_RE.replace_all(&raw, " ");
    decode_entities(collapsed.trim_matches(' '))
}

fn is_task_list(node: &Markup) -> bool {
    matches!(node, Markup::Element { tag, .. } if tag == "ul" || tag == "ol")
        && node.attr("data-type") == Some("taskList")
}

fn collect_blocks(nodes: &[Markup], out: &mut Vec<Node>) {
    let mut loose_inline: Vec<Markup> = Vec::new();
    for node in nodes {
        match node {
            Markup::Text(_) => loose_inline.push(node.clone()),
            Markup::Element { tag, .. } if INLINE_TAGS.contains(&tag.as_str()) => {
                loose_inline.push(node.clone());
            }
            Markup::Element { tag, children, .. } if tag == "p" => {
                flush_inline(&mut loose_inline, out);
                out.push(Node::paragraph_from_text(normalized_text(children)));
            }
            Markup::Element { children, .. } if is_task_list(node) => {
                flush_inline(&mut loose_inline, out);
                let items = children
                    .iter()
                    .filter_map(task_item_from_markup)
                    .collect::<Vec<_>>();
                if !items.is_empty() {
                    out.push(task_list(items));
                }
            }
            Markup::Element { children, .. } => {
                flush_inline(&mut loose_inline, out);
                collect_blocks(children, out);
            }
        }
    }
    flush_inline(&mut loose_inline, out);
}

fn flush_inline(pending: &mut Vec<Markup>, out: &mut Vec<Node>) {
    if pending.is_empty() {
        return;
    }
    let text = normalized_text(pending);
    pending.clear();
    if !text.is_empty() {
        out.push(Node::paragraph_from_text(text));
    }
}

fn task_item_from_markup(node: &Markup) -> Option<Node> {
    let Markup::Element { tag, children, .. } = node else {
        return None;
    };
    if tag != "li" {
        return None;
    }
    let done = node
        .attr("data-done")
        .is_some_and(|value| value.eq_ignore_ascii_case("true"));
    Some(Node::TaskItem {
        attrs: TaskItemAttrs::new(done),
        content: vec![Node::paragraph_from_text(normalized_text(children))],
    })
}

/// Serializes a document (or any subtree) to HTML.
pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_html(node, &mut out);
    out
}

fn write_html(node: &Node, out: &mut String) {
    match node {
        Node::Doc { content } => {
            for child in content {
                write_html(child, out);
            }
        }
        Node::Paragraph { content } => {
            out.push_str("<p>");
            for child in content {
                write_html(child, out);
            }
            out.push_str("</p>");
        }
        Node::Text { text } => out.push_str(&escape_html(text)),
        Node::TaskList { content } => {
            out.push_str(r#"<ul data-type="taskList">"#);
            for child in content {
                write_html(child, out);
            }
            out.push_str("</ul>");
        }
        Node::TaskItem { attrs, content } => {
            out.push_str(&format!(
                r#"<li data-type="taskItem" data-done="{}">"#,
                attrs.done
            ));
            for child in content {
                write_html(child, out);
            }
            out.push_str("</li>");
        }
    }
}

/// Escapes markup characters and any whitespace the parser would collapse,
/// so `parse_html(to_html(doc)) == doc`.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut after_literal_space = true;
    while let Some(ch) = chars.next() {
        let literal_space = ch == ' ' && !after_literal_space && chars.peek().is_some();
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\u{a0}' => escaped.push_str("&nbsp;"),
            ' ' if literal_space => escaped.push(' '),
            ' ' | '\t' | '\n' | '\r' | '\x0C' => {
                escaped.push_str(&format!("&#{};", u32::from(ch)));
            }
            other => escaped.push(other),
        }
        after_literal_space = literal_space;
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{decode_entities, parse_html, to_html, HtmlParseError};
    use crate::model::node::builders::{
        doc, empty_doc, empty_paragraph, paragraph, task_item, task_item_done, task_list,
    };

    #[test]
    fn parses_single_paragraph() {
        let parsed = parse_html("<p>Hello world</p>").expect("valid html");
        assert_eq!(parsed, doc(vec![paragraph("Hello world")]));
    }

    #[test]
    fn parses_task_list_with_done_flags() {
        let parsed = parse_html(
            r#"<p>Intro</p><ul data-type="taskList">
                <li data-type="taskItem" data-done="true"><p>ship</p></li>
                <li data-type="taskItem" data-done="false"></li>
            </ul>"#,
        )
        .expect("valid html");
        assert_eq!(
            parsed,
            doc(vec![
                paragraph("Intro"),
                task_list(vec![
                    task_item_done(paragraph("ship")),
                    task_item(empty_paragraph()),
                ]),
            ])
        );
    }

    #[test]
    fn empty_or_whitespace_input_yields_empty_doc() {
        assert_eq!(parse_html("").expect("empty input"), empty_doc());
        assert_eq!(parse_html("  \n ").expect("blank input"), empty_doc());
        assert_eq!(
            parse_html(r#"<ul data-type="taskList"></ul>"#).expect("empty list"),
            empty_doc()
        );
    }

    #[test]
    fn unknown_wrappers_are_transparent_and_loose_text_becomes_paragraph() {
        let parsed = parse_html("<div><p>a</p>loose <strong>bold</strong></div>")
            .expect("valid html");
        assert_eq!(parsed, doc(vec![paragraph("a"), paragraph("loose bold")]));
    }

    #[test]
    fn unclosed_elements_are_closed_at_end_of_input() {
        let parsed = parse_html("<p>open").expect("lenient parse");
        assert_eq!(parsed, doc(vec![paragraph("open")]));
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        assert_eq!(
            parse_html("<p>text</p><ul"),
            Err(HtmlParseError::UnterminatedTag { offset: 11 })
        );
        assert_eq!(
            parse_html("<p>a</p></p"),
            Err(HtmlParseError::UnterminatedTag { offset: 8 })
        );
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        assert_eq!(
            parse_html("<p>1 < 2</p><3").expect("lenient parse"),
            doc(vec![paragraph("1 < 2"), paragraph("<3")])
        );
    }

    #[test]
    fn nbsp_is_kept_and_ascii_whitespace_collapses() {
        assert_eq!(
            parse_html("<p> a&nbsp;&nbsp;b \n\t c </p>").expect("valid html"),
            doc(vec![paragraph("a\u{a0}\u{a0}b c")])
        );
    }

    #[test]
    fn whitespace_survives_own_output() {
        let document = doc(vec![
            paragraph(" a\u{a0}\u{a0}b  c "),
            paragraph("tab\there\nnext"),
        ]);
        let html = to_html(&document);
        assert_eq!(
            html,
            "<p>&#32;a&nbsp;&nbsp;b &#32;c&#32;</p><p>tab&#9;here&#10;next</p>"
        );
        assert_eq!(parse_html(&html).expect("own output parses"), document);
    }

    #[test]
    fn entities_decode_and_escape_symmetrically() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#65;&#x42; &bogus;"), "a & b <c> AB &bogus;");
        let document = doc(vec![paragraph("1 < 2 & \"q\"")]);
        let html = to_html(&document);
        assert_eq!(html, "<p>1 &lt; 2 &amp; &quot;q&quot;</p>");
        assert_eq!(parse_html(&html).expect("own output parses"), document);
    }

    #[test]
    fn serializes_task_items_with_done_attribute() {
        let document = doc(vec![task_list(vec![
            task_item(paragraph("a")),
            task_item_done(empty_paragraph()),
        ])]);
        assert_eq!(
            to_html(&document),
            concat!(
                r#"<ul data-type="taskList">"#,
                r#"<li data-type="taskItem" data-done="false"><p>a</p></li>"#,
                r#"<li data-type="taskItem" data-done="true"><p></p></li>"#,
                "</ul>"
            )
        );
    }
}
