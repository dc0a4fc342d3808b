//! Markup parser for a pragmatic HTML subset.
//!
//! The parser is lenient in the same places browsers are: unknown closing
//! tags are dropped, elements left open at the end of input are closed, and a
//! closing tag closes every element opened after its match. It only fails on
//! input it cannot tokenize at all (a tag or comment cut off by the end of
//! input).

use crate::error::DomError;
use crate::node::{NodeRef, VOID_ELEMENTS};

/// Parses `markup` into a detached fragment.
pub fn parse_fragment(markup: &str) -> Result<NodeRef, DomError> {
    let fragment = NodeRef::fragment();
    let mut open: Vec<NodeRef> = vec![fragment.clone()];
    let mut rest = markup;

    while !rest.is_empty() {
        let current = open.last().cloned().unwrap_or_else(|| fragment.clone());

        if let Some(after) = rest.strip_prefix("<!--") {
            let end = after
                .find("-->")
                .ok_or_else(|| DomError::Malformed("unterminated comment".to_string()))?;
            current.append_child(NodeRef::comment(&after[..end]));
            rest = &after[end + 3..];
        } else if let Some(after) = rest.strip_prefix("<!") {
            // doctype and other declarations carry nothing for the tree
            let end = after
                .find('>')
                .ok_or_else(|| DomError::Malformed("unterminated declaration".to_string()))?;
            rest = &after[end + 1..];
        } else if let Some(after) = rest.strip_prefix("</") {
            let end = after
                .find('>')
                .ok_or_else(|| DomError::Malformed("unterminated closing tag".to_string()))?;
            let name = after[..end].trim().to_ascii_lowercase();
            close_element(&mut open, &name);
            rest = &after[end + 1..];
        } else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
        {
            let (tag, consumed) = parse_start_tag(&rest[1..])?;
            rest = &rest[1 + consumed..];

            let keep_open = !tag.self_closing && !VOID_ELEMENTS.contains(&tag.name.as_str());
            let element = tag.into_node();
            current.append_child(element.clone());
            if keep_open {
                open.push(element);
            }
        } else {
            // a lone '<' that does not start a tag is text
            let skip = if rest.starts_with('<') { 1 } else { 0 };
            let end = rest[skip..].find('<').map(|i| i + skip).unwrap_or(rest.len());
            current.append_child(NodeRef::text(decode_entities(&rest[..end])));
            rest = &rest[end..];
        }
    }

    Ok(fragment)
}

struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
}

impl StartTag {
    fn into_node(self) -> NodeRef {
        let node = NodeRef::element(&self.name);
        for (name, value) in &self.attributes {
            node.set_attr(name, value);
        }
        node
    }
}

fn close_element(open: &mut Vec<NodeRef>, name: &str) {
    // index 0 is the fragment itself and is never closed
    let position = open
        .iter()
        .skip(1)
        .rposition(|node| node.tag().as_deref() == Some(name));
    if let Some(index) = position {
        open.truncate(index + 1);
    }
}

/// Parses the inside of a start tag (after `<`). Returns the tag and the
/// number of bytes consumed, including the closing `>`.
///
/// Only ASCII whitespace separates names and values, as in HTML; any other
/// character, U+00A0 included, is part of the name or value it appears in.
fn parse_start_tag(input: &str) -> Result<(StartTag, usize), DomError> {
    let unterminated = || DomError::Malformed(format!("unterminated tag <{}", preview(input)));
    let bytes = input.as_bytes();
    let name_end = input
        .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
        .ok_or_else(unterminated)?;
    let name = input[..name_end].to_ascii_lowercase();
    let mut pos = name_end;

    let mut attributes = Vec::new();
    let mut self_closing = false;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return Err(unterminated()),
            Some(b'>') => {
                pos += 1;
                break;
            }
            Some(b'/') => {
                self_closing = true;
                pos += 1;
                continue;
            }
            Some(_) => {}
        }
        self_closing = false;

        let attr_end = input[pos..]
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '>' || c == '/')
            .map(|i| pos + i)
            .ok_or_else(unterminated)?;
        if attr_end == pos {
            // a stray '=' with no name before it
            pos += input[pos..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        let attr_name = input[pos..attr_end].to_ascii_lowercase();
        pos = attr_end;

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            attributes.push((attr_name, String::new()));
            continue;
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let value = match bytes.get(pos) {
            None => return Err(unterminated()),
            Some(&quote @ (b'"' | b'\'')) => {
                let close = input[pos + 1..]
                    .find(quote as char)
                    .ok_or_else(unterminated)?;
                let raw = &input[pos + 1..pos + 1 + close];
                pos += close + 2;
                raw
            }
            Some(_) => {
                let end = input[pos..]
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .map(|i| pos + i)
                    .ok_or_else(unterminated)?;
                let raw = &input[pos..end];
                pos = end;
                raw
            }
        };
        attributes.push((attr_name, decode_entities(value)));
    }

    Ok((
        StartTag {
            name,
            attributes,
            self_closing,
        },
        pos,
    ))
}

fn preview(input: &str) -> String {
    input.chars().take(20).collect()
}

/// Decodes the character references templates commonly emit.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match candidate.find(';').filter(|end| *end <= 10) {
            Some(end) => match decode_entity(&candidate[1..end]) {
                Some(c) => {
                    out.push(c);
                    rest = &candidate[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &candidate[1..];
                }
            },
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(|c: char| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
