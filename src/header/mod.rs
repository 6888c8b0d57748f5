use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{Error, Result};


/// Header names mapped to their values, keyed by canonical name.
///
/// Names are compared case-insensitively: `content-type`, `CONTENT-TYPE` and
/// `Content-Type` are the same entry. Distinct names keep their insertion
/// order and each name keeps its values in call order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all values of `name` with the single `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = canonical_name(name);
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = vec![value],
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Appends `value` to the values of `name`.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        let name = canonical_name(name);
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// First value of `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(&canonical_name(name)) {
            Some(index) => &self.entries[index].1,
            None => &[],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(&canonical_name(name)).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let index = self.position(&canonical_name(name))?;
        Some(self.entries.remove(index).1)
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over every `(name, value)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(name, values)| {
            values
                .iter()
                .map(move |value| (name.as_str(), value.as_str()))
        })
    }

    /// Converts into the header map sent on the wire.
    ///
    /// Fails if a name or value is not valid on the wire.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in self.iter() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::RequestConstruction(format!("invalid header name {name:?}: {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                Error::RequestConstruction(format!("invalid value for header {name}: {e}"))
            })?;
            map.append(header_name, header_value);
        }
        Ok(map)
    }

    fn position(&self, canonical: &str) -> Option<usize> {
        self.entries.iter().position(|(name, _)| name == canonical)
    }
}

/// Returns the canonical form of a header name.
///
/// The first letter and any letter following a hyphen are upper-cased, the
/// rest lower-cased. Names containing bytes that are not valid in a header
/// token are returned unchanged.
pub fn canonical_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
