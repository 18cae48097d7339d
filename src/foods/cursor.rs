use std::fmt;

/// Continuation point after the last row of a page sorted by
/// `(key DESC, id ASC)`.
///
/// Wire form is `"<key>|<id>"`. Callers should treat it as opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCursor {
    pub key: i64,
    pub id: String,
}

impl SearchCursor {
    pub fn new(key: i64, id: impl Into<String>) -> Self {
        Self { key, id: id.into() }
    }

    /// Parses a token. Anything malformed is treated as "no cursor".
    ///
    /// The id is taken verbatim so that ids with surrounding whitespace still
    /// resume after the right row.
    pub fn decode(token: &str) -> Option<Self> {
        let (key, id) = token.split_once('|')?;
        let key = key.trim().parse::<i64>().ok()?;
        if id.trim().is_empty() {
            return None;
        }
        Some(Self::new(key, id))
    }

    /// True when a row sorted by `(key DESC, id ASC)` comes after this cursor.
    pub fn admits(&self, key: i64, id: &str) -> bool {
        key < self.key || (key == self.key && id > self.id.as_str())
    }
}

impl fmt::Display for SearchCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.key, self.id)
    }
}
