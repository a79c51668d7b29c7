//! Case-insensitive multi-valued header map.
//!
//! Headers keep insertion order and the spelling of the first insertion.
//! Lookup ignores ASCII case. A handful of headers only ever hold one value
//! and most others can be collapsed into one line when written to the wire.

pub const ACCEPT: &str = "Accept";
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub const AGE: &str = "Age";
pub const AUTHORIZATION: &str = "Authorization";
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_LOCATION: &str = "Content-Location";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const COOKIE: &str = "Cookie";
pub const EXPECT: &str = "Expect";
pub const EXPIRES: &str = "Expires";
pub const LOCATION: &str = "Location";
pub const SET_COOKIE: &str = "Set-Cookie";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
pub const USER_AGENT: &str = "User-Agent";

const SINGLE_VALUE_HEADERS: [&str; 9] = [
    AGE,
    CONTENT_ENCODING,
    CONTENT_LENGTH,
    CONTENT_LOCATION,
    CONTENT_TYPE,
    EXPECT,
    EXPIRES,
    LOCATION,
    USER_AGENT,
];

/// Headers for which only the last value is meaningful.
pub fn is_single_value(name: &str) -> bool {
    SINGLE_VALUE_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Headers whose values may be joined into one line.
pub fn is_collapsible(name: &str) -> bool {
    !name.eq_ignore_ascii_case(SET_COOKIE) && !is_single_value(name)
}

/// Separator used when collapsing values of `name`.
pub fn collapse_separator(name: &str) -> &'static str {
    if name.eq_ignore_ascii_case(COOKIE) {
        "; "
    } else {
        ", "
    }
}

/// Join `values` the way `name` is collapsed on the wire.
pub fn collapse<S: AsRef<str>>(name: &str, values: &[S]) -> String {
    let separator = collapse_separator(name);
    values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(separator)
}

/// How a header line is handed to a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderWrite {
    /// Replace any existing value for the name.
    Set,
    /// Add another line for the name.
    Add,
}

/// Ordered, case-insensitive map from header names to values.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Values for `name`. Single-value headers yield at most the last value.
    pub fn get(&self, name: &str) -> &[String] {
        let Some(index) = self.position(name) else {
            return &[];
        };
        let values = &self.entries[index].1;
        if is_single_value(name) && values.len() > 1 {
            &values[values.len() - 1..]
        } else {
            values
        }
    }

    /// The last value for `name`.
    pub fn get_last(&self, name: &str) -> Option<&str> {
        self.get(name).last().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some_and(|i| !self.entries[i].1.is_empty())
    }

    /// Replace all values for `name` with `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.set_all(name, [value.into()])
    }

    /// Replace all values for `name` with `values`.
    pub fn set_all<I, V>(&mut self, name: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = values,
            None => self.entries.push((name, values)),
        }
        self
    }

    /// Add `value` to `name`. Single-value headers are replaced instead.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        if is_single_value(&name) {
            return self.set(name, value);
        }
        match self.position(&name) {
            Some(index) => self.entries[index].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
        self
    }

    pub fn append_all<I, V>(&mut self, name: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        for value in values {
            self.append(name.clone(), value);
        }
        self
    }

    /// Replace every name present in `other` with its values.
    pub fn put_all(&mut self, other: &Headers) -> &mut Self {
        for (name, values) in &other.entries {
            self.set_all(name.clone(), values.iter().cloned());
        }
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let index = self.position(name)?;
        Some(self.entries.remove(index).1)
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate names with all stored values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Emit the headers as wire lines.
    ///
    /// Collapsible headers become one `Set` line joined by their separator,
    /// single-value headers one `Set` line with the last value, and the rest
    /// (`Set-Cookie`) one `Add` line per value.
    pub fn for_each_wire_line(&self, mut write: impl FnMut(HeaderWrite, &str, &str)) {
        for (name, values) in &self.entries {
            if values.is_empty() {
                continue;
            }
            if is_collapsible(name) {
                write(HeaderWrite::Set, name, &collapse(name, values));
            } else if is_single_value(name) {
                if let Some(last) = values.last() {
                    write(HeaderWrite::Set, name, last);
                }
            } else {
                for value in values {
                    write(HeaderWrite::Add, name, value);
                }
            }
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, values)| other.position(name).is_some_and(|i| other.entries[i].1 == values))
    }
}

impl std::fmt::Display for Headers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, values) in self.iter() {
            writeln!(f, "{} : {}", name, collapse(name, values))?;
        }
        Ok(())
    }
}
