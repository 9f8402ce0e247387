//! Filter values shared across tables.

/// Column name → raw value, applied to every table that has a primary-key
/// column of the same name.
///
/// Names match case-insensitively and exactly: `CLIENT_ID` never matches
/// `CLIENT_ID2`. Entries keep their first insertion position for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedValueStore {
    entries: Vec<(String, String)>,
}

impl SharedValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(column, value)` pairs, skipping blank values.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut store = Self::new();
        for (k, v) in pairs {
            store.put(k.as_ref(), v);
        }
        store
    }

    /// Look up the raw value for `column`.
    pub fn lookup(&self, column: &str) -> Option<&str> {
        let key = normalize(column);
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace a value. Blank names or values are ignored and
    /// reported as `false`.
    pub fn put(&mut self, column: &str, value: impl Into<String>) -> bool {
        let key = normalize(column);
        let value = value.into();
        if key.is_empty() || value.trim().is_empty() {
            return false;
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn normalize(column: &str) -> String {
    column.trim().to_ascii_uppercase()
}
