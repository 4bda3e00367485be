use crate::error::MarkupError;
use crate::markup_ast::{MarkupAttr, MarkupNode};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Minimal hand-rolled HTML-ish parser with support for:
/// - nested elements, void elements and self-closing tags (`<input/>`)
/// - quoted, unquoted and boolean attributes
/// - comments and doctype declarations (skipped)
/// - text with `{{ interpolation }}` markers kept verbatim
pub fn parse_markup(input: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut i = 0usize;
    let bytes = input.as_bytes();
    let mut stack: Vec<MarkupNode> = Vec::new();
    let mut roots: Vec<MarkupNode> = Vec::new();

    fn push_child(stack: &mut [MarkupNode], roots: &mut Vec<MarkupNode>, node: MarkupNode) {
        if let Some(MarkupNode::Element { children, .. }) = stack.last_mut() {
            children.push(node);
        } else {
            roots.push(node);
        }
    }

    while i < bytes.len() {
        if bytes[i] == b'<' && starts_markup(bytes, i) {
            // comment or doctype
            if bytes[i + 1] == b'!' {
                let start = i;
                if input[i..].starts_with("<!--") {
                    match input[i + 4..].find("-->") {
                        Some(end) => i += 4 + end + 3,
                        None => return Err(MarkupError::UnterminatedComment { pos: start }),
                    }
                } else {
                    match input[i..].find('>') {
                        Some(end) => i += end + 1,
                        None => return Err(MarkupError::UnterminatedComment { pos: start }),
                    }
                }
                continue;
            }

            // closing tag?
            if bytes[i + 1] == b'/' {
                i += 2;
                let tag = read_ident(input, bytes, &mut i);
                skip_ws(bytes, &mut i);
                if i < bytes.len() && bytes[i] == b'>' {
                    i += 1;
                }
                // close back to the matching open tag; stray closers are ignored
                let open = stack
                    .iter()
                    .rposition(|n| matches!(n, MarkupNode::Element { tag: t, .. } if t.eq_ignore_ascii_case(&tag)));
                if let Some(pos) = open {
                    while stack.len() > pos {
                        if let Some(n) = stack.pop() {
                            push_child(&mut stack, &mut roots, n);
                        }
                    }
                }
                continue;
            }

            // opening or self-closing tag
            let start = i;
            i += 1;
            let tag = read_ident(input, bytes, &mut i);
            let mut attrs: Vec<MarkupAttr> = Vec::new();
            let mut self_closing = false;
            let mut closed = false;

            loop {
                skip_ws(bytes, &mut i);
                if i >= bytes.len() {
                    break;
                }
                match bytes[i] {
                    b'/' => {
                        self_closing = true;
                        i += 1;
                        skip_ws(bytes, &mut i);
                        if i < bytes.len() && bytes[i] == b'>' {
                            i += 1;
                            closed = true;
                        }
                        break;
                    }
                    b'>' => {
                        i += 1;
                        closed = true;
                        break;
                    }
                    _ => {
                        if let Some(attr) = read_attribute(input, bytes, &mut i) {
                            // last write wins for duplicate names
                            attrs.retain(|a| a.name != attr.name);
                            attrs.push(attr);
                        } else {
                            // skip unknown token
                            i += 1;
                        }
                    }
                }
            }

            if !closed {
                return Err(MarkupError::UnterminatedTag { tag, pos: start });
            }

            let node = MarkupNode::Element {
                tag: tag.clone(),
                attrs,
                children: Vec::new(),
                self_closing,
            };
            if self_closing || is_void_element(&tag) {
                push_child(&mut stack, &mut roots, node);
            } else {
                stack.push(node);
            }
        } else {
            // text until the next tag
            let start = i;
            i += 1;
            while i < bytes.len() && !(bytes[i] == b'<' && starts_markup(bytes, i)) {
                i += 1;
            }
            let raw = &input[start..i];
            let text = if is_all_ws(raw) {
                // keep a single space between elements
                " ".to_string()
            } else {
                decode_entities(raw)
            };
            push_child(&mut stack, &mut roots, MarkupNode::Text(text));
        }
    }

    // Unclosed tags: close them at end of input
    while let Some(n) = stack.pop() {
        push_child(&mut stack, &mut roots, n);
    }

    // Trim root whitespace-only text nodes
    roots.retain(|n| match n {
        MarkupNode::Text(t) => !is_all_ws(t),
        _ => true,
    });

    Ok(roots)
}

/// A `<` only opens markup when followed by a tag name, `/` or `!`.
fn starts_markup(bytes: &[u8], i: usize) -> bool {
    match bytes.get(i + 1) {
        Some(c) => c.is_ascii_alphabetic() || *c == b'/' || *c == b'!',
        None => false,
    }
}

fn is_all_ws(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace())
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && (bytes[*i] as char).is_whitespace() {
        *i += 1;
    }
}

fn read_ident(input: &str, bytes: &[u8], i: &mut usize) -> String {
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i] as char;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ':' {
            *i += 1;
        } else {
            break;
        }
    }
    input[start..*i].to_ascii_lowercase()
}

fn read_attribute(input: &str, bytes: &[u8], i: &mut usize) -> Option<MarkupAttr> {
    let name_start = *i;
    while *i < bytes.len() {
        let c = bytes[*i] as char;
        if c.is_whitespace() || c == '=' || c == '>' || c == '/' || c == '"' || c == '\'' {
            break;
        }
        *i += 1;
    }
    if *i == name_start {
        return None;
    }
    let name = input[name_start..*i].to_string();

    let before_eq = *i;
    skip_ws(bytes, i);
    let mut value: Option<String> = None;
    if *i < bytes.len() && bytes[*i] == b'=' {
        *i += 1;
        skip_ws(bytes, i);
        value = Some(read_value(input, bytes, i).map(|v| decode_entities(&v)).unwrap_or_default());
    } else {
        // boolean attribute: leave the whitespace for the tag loop
        *i = before_eq;
    }

    Some(MarkupAttr { name, value })
}

fn read_value(input: &str, bytes: &[u8], i: &mut usize) -> Option<String> {
    if *i >= bytes.len() {
        return None;
    }
    let quote = bytes[*i];
    if quote == b'"' || quote == b'\'' {
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        let s = input[start..*i].to_string();
        if *i < bytes.len() {
            *i += 1;
        } // consume closing quote
        return Some(s);
    }
    let start = *i;
    while *i < bytes.len() && !(bytes[*i] as char).is_whitespace() && bytes[*i] != b'>' {
        *i += 1;
    }
    Some(input[start..*i].to_string())
}

pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
