use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    Tag(String),
    Class(String),
    Id(String),
}

impl SimpleSelector {
    /// Supports `tag`, `.class` and `#id`. Anything else yields `None`.
    pub fn parse(sel: &str) -> Option<Self> {
        let sel = sel.trim();
        let valid = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if let Some(rest) = sel.strip_prefix('#') {
            return valid(rest).then(|| SimpleSelector::Id(rest.to_string()));
        }
        if let Some(rest) = sel.strip_prefix('.') {
            return valid(rest).then(|| SimpleSelector::Class(rest.to_string()));
        }
        valid(sel).then(|| SimpleSelector::Tag(sel.to_ascii_lowercase()))
    }

    pub fn matches(&self, tag: &str, id_attr: Option<&str>, class_attr: Option<&str>) -> bool {
        match self {
            SimpleSelector::Tag(t) => t.eq_ignore_ascii_case(tag),
            SimpleSelector::Id(i) => id_attr == Some(i.as_str()),
            SimpleSelector::Class(c) => {
                class_attr.is_some_and(|classes| classes.split_whitespace().any(|x| x == c))
            }
        }
    }
}

/// Parse an inline `style` attribute into ordered declarations.
pub fn parse_declarations(style: &str) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for decl in style.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        if let Some((k, v)) = decl.split_once(':') {
            map.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    map
}

/// Override/add declarations on top of an existing inline style.
pub fn merge_styles(existing: Option<&str>, updates: &[(&str, &str)]) -> String {
    let mut map = existing.map(parse_declarations).unwrap_or_default();
    for (k, v) in updates {
        map.insert(k.to_string(), v.to_string());
    }
    let mut out = String::new();
    for (i, (k, v)) in map.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(k);
        out.push_str(": ");
        out.push_str(v);
        out.push(';');
    }
    out
}
