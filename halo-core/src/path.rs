use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty key path")]
    Empty,
    #[error("unexpected '{ch}' at offset {pos} in key path")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unterminated '[' starting at offset {pos} in key path")]
    Unterminated { pos: usize },
    #[error("index {index} is too far past the end of a list of {len}")]
    IndexTooLarge { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A dotted/bracketed key chain such as `user.name` or `items[0]["id"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let src = input.trim();
        let bytes = src.as_bytes();
        let mut i = 0usize;
        let mut segments = Vec::new();

        if bytes.is_empty() {
            return Err(PathError::Empty);
        }

        while i < bytes.len() {
            match bytes[i] {
                b'[' => {
                    let open = i;
                    i += 1;
                    segments.push(read_bracket(src, bytes, &mut i, open)?);
                }
                b'.' => {
                    // a dot must follow a segment and precede a key
                    if segments.is_empty() || i + 1 >= bytes.len() {
                        return Err(PathError::UnexpectedChar { ch: '.', pos: i });
                    }
                    i += 1;
                    let key = read_key(src, bytes, &mut i);
                    if key.is_empty() {
                        return Err(unexpected(src, i));
                    }
                    segments.push(Segment::Key(key));
                }
                b']' => return Err(PathError::UnexpectedChar { ch: ']', pos: i }),
                _ if segments.is_empty() => {
                    let key = read_key(src, bytes, &mut i);
                    segments.push(Segment::Key(key));
                }
                _ => return Err(unexpected(src, i)),
            }
        }

        Ok(Path { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// This path extended by one segment.
    pub fn child(&self, seg: Segment) -> Path {
        let mut segments = self.segments.clone();
        segments.push(seg);
        Path { segments }
    }

    /// `self` followed by every segment of `rest`.
    pub fn join(&self, rest: &[Segment]) -> Path {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(rest);
        Path { segments }
    }

    /// Resolve against a value, returning `None` on any missing segment.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |cur, seg| step(cur, seg))
    }
}

pub(crate) fn step<'a>(cur: &'a Value, seg: &Segment) -> Option<&'a Value> {
    match (cur, seg) {
        (Value::Object(map), Segment::Key(k)) => map.get(k),
        (Value::Object(map), Segment::Index(i)) => map.get(&i.to_string()),
        (Value::Array(items), Segment::Index(i)) => items.get(*i),
        (Value::Array(items), Segment::Key(k)) => k.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn unexpected(src: &str, pos: usize) -> PathError {
    let ch = src[pos..].chars().next().unwrap_or(' ');
    PathError::UnexpectedChar { ch, pos }
}

fn read_key(src: &str, bytes: &[u8], i: &mut usize) -> String {
    let start = *i;
    while *i < bytes.len() && bytes[*i] != b'.' && bytes[*i] != b'[' && bytes[*i] != b']' {
        *i += 1;
    }
    src[start..*i].trim().to_string()
}

fn read_bracket(src: &str, bytes: &[u8], i: &mut usize, open: usize) -> Result<Segment, PathError> {
    let quote = bytes.get(*i).copied();
    let seg = if matches!(quote, Some(b'"') | Some(b'\'')) {
        *i += 1;
        let start = *i;
        while *i < bytes.len() && Some(bytes[*i]) != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(PathError::Unterminated { pos: open });
        }
        let key = src[start..*i].to_string();
        *i += 1;
        Segment::Key(key)
    } else {
        let start = *i;
        while *i < bytes.len() && bytes[*i] != b']' {
            *i += 1;
        }
        let raw = src[start..(*i).min(bytes.len())].trim();
        match raw.parse::<usize>() {
            Ok(n) => Segment::Index(n),
            Err(_) if raw.is_empty() => return Err(PathError::UnexpectedChar { ch: ']', pos: start }),
            Err(_) => Segment::Key(raw.to_string()),
        }
    };
    if *i >= bytes.len() || bytes[*i] != b']' {
        return Err(PathError::Unterminated { pos: open });
    }
    *i += 1;
    Ok(seg)
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Key(k) if needs_quotes(k) => {
                    let q = if k.contains('"') { '\'' } else { '"' };
                    write!(f, "[{q}{k}{q}]")?
                }
                Segment::Key(k) if n == 0 => write!(f, "{k}")?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

fn needs_quotes(key: &str) -> bool {
    key.is_empty() || key != key.trim() || key.contains(['.', '[', ']'])
}
