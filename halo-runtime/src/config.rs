use serde::{Deserialize, Serialize};

pub const DEFAULT_PREFIX: &str = "m-";

/// Engine options. Missing keys take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Suppress informational logging.
    pub silent: bool,
    /// Marker that turns an attribute name into a directive name.
    pub attribute_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            silent: false,
            attribute_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl Config {
    pub fn from_json(src: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(src)
    }

    /// The bare directive name for `attr`, if it carries the prefix.
    pub fn directive_name<'a>(&self, attr: &'a str) -> Option<&'a str> {
        attr.strip_prefix(self.attribute_prefix.as_str())
            .filter(|rest| !rest.is_empty())
    }
}
