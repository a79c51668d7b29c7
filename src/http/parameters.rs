//! Request parameters and their form encoding.

/// Value of a request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    /// Sent as repeated `name[]` entries.
    List(Vec<String>),
}

/// Ordered list of request parameters.
pub type Parameters = Vec<(String, ParamValue)>;

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

macro_rules! param_value_from_display {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                Self::Text(value.to_string())
            }
        })*
    };
}

param_value_from_display!(bool, i32, i64, u32, u64, usize, f64);

/// Flatten parameters into `(name, value)` pairs, expanding lists to `name[]`.
pub fn flatten(parameters: &[(String, ParamValue)]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (name, value) in parameters {
        match value {
            ParamValue::Text(text) => pairs.push((name.clone(), text.clone())),
            ParamValue::List(items) => {
                let key = format!("{name}[]");
                pairs.extend(items.iter().map(|item| (key.clone(), item.clone())));
            }
        }
    }
    pairs
}

/// `application/x-www-form-urlencoded` rendition of the parameters.
pub fn encode_form(parameters: &[(String, ParamValue)]) -> String {
    flatten(parameters)
        .iter()
        .map(|(name, value)| {
            if value.is_empty() {
                urlencoding::encode(name).into_owned()
            } else {
                format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_text_and_list_values() {
        let params: Parameters = vec![
            ("q".into(), "rust http".into()),
            ("tag".into(), vec!["a", "b&c"].into()),
            ("flag".into(), "".into()),
            ("page".into(), 2u32.into()),
        ];
        assert_eq!(
            encode_form(&params),
            "q=rust%20http&tag%5B%5D=a&tag%5B%5D=b%26c&flag&page=2"
        );
    }
}
